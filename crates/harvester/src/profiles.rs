//! Backfill of the user profile directory.
//!
//! Profiles arrive for free on stargazer edges; users who only opened
//! issues or pull requests are resolved through the search endpoint,
//! chunked to its page-size ceiling.

use std::collections::HashSet;

use anyhow::Result;
use records::models::{IssueRecord, ProfileRecord, StargazerRecord};
use records::parse;
use tracing::info;

use crate::client::GithubTransport;
use crate::merge;
use crate::pagination::paginate;
use crate::progress::ProgressMode;
use crate::query;
use crate::store::TableSet;

/// Search endpoint page-size ceiling; identifier chunks never exceed it.
const SEARCH_CHUNK: usize = 100;

/// Build the profile directory for one project: every known identity,
/// backfilled with a chunked search for users referenced by issues or pull
/// requests but not yet known. At most one row per `user` survives; the
/// result is sorted by `user`.
pub async fn resolve(
    transport: &dyn GithubTransport,
    issues: &[IssueRecord],
    pull_requests: &[IssueRecord],
    stargazers: &[StargazerRecord],
    previous: Option<&TableSet>,
    page_size: u32,
    progress: ProgressMode,
) -> Result<Vec<ProfileRecord>> {
    let mut known: Vec<ProfileRecord> = stargazers
        .iter()
        .map(|event| event.profile.clone())
        .collect();
    if let Some(tables) = previous {
        known.extend(tables.profiles.iter().cloned());
        known.extend(tables.stargazers.iter().map(|event| event.profile.clone()));
    }
    let mut directory = merge::dedupe_profiles(known);

    let missing = missing_users(issues, pull_requests, &directory);
    if !missing.is_empty() {
        info!(count = missing.len(), "backfilling missing user profiles");
        let mut sink = progress.sink();
        sink.start("users", missing.len() as u64);

        let mut fetched = Vec::new();
        for chunk in missing.chunks(SEARCH_CHUNK) {
            let query = query::user_search(chunk, page_size);
            let rows = paginate(transport, &query, parse::search_user, sink.as_mut()).await?;
            fetched.extend(rows);
        }

        directory.extend(fetched);
        directory = merge::dedupe_profiles(directory);
    }

    directory.sort_by(|a, b| a.user.cmp(&b.user));
    Ok(directory)
}

/// Referenced minus known, in first-seen order so chunking stays
/// deterministic across runs.
fn missing_users(
    issues: &[IssueRecord],
    pull_requests: &[IssueRecord],
    known: &[ProfileRecord],
) -> Vec<String> {
    let known: HashSet<&str> = known.iter().map(|profile| profile.user.as_str()).collect();
    let mut seen = HashSet::new();
    let mut missing = Vec::new();
    for row in issues.iter().chain(pull_requests) {
        let Some(user) = &row.user else { continue };
        if !known.contains(user.as_str()) && seen.insert(user.clone()) {
            missing.push(user.clone());
        }
    }
    missing
}
