//! Incremental merge and key-based deduplication.
//!
//! The snapshot is immutable input; merging produces a new table where
//! every identity key appears exactly once and the most recently observed
//! state wins for a contested key.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use chrono::NaiveDateTime;
use records::models::{IssueRecord, ProfileRecord, StargazerRecord};

/// Latest timestamp observed in previously persisted issue rows for one
/// repository. The next incremental fetch only requests entities changed
/// since this instant; absent rows mean a full fetch.
pub fn watermark(prior: &[IssueRecord]) -> Option<NaiveDateTime> {
    prior
        .iter()
        .flat_map(|row| [Some(row.created_at), Some(row.updated_at), row.closed_at])
        .flatten()
        .max()
}

/// Merge freshly fetched issue rows with the snapshot's rows for the same
/// repository. An empty fetch keeps the snapshot untouched (zero-result
/// means "nothing changed", not "everything deleted"); otherwise prior and
/// fresh are concatenated with fresh listed last and deduplicated on
/// `(repository, number)` keeping the last occurrence, so the most recently
/// observed state wins a contested key. The result is sorted by
/// `(created_at, closed_at)` ascending, open rows last.
pub fn merge_issues(prior: Vec<IssueRecord>, fresh: Vec<IssueRecord>) -> Vec<IssueRecord> {
    if fresh.is_empty() && !prior.is_empty() {
        return prior;
    }

    let mut combined = prior;
    combined.extend(fresh);
    let mut merged = dedupe_last(combined, issue_key);
    merged.sort_by_key(issue_order);
    merged
}

/// Drop duplicate `(repository, number)` keys from a single fetch, keeping
/// the last occurrence, so the unique-key invariant holds for tables that
/// never merge with a snapshot.
pub fn dedupe_issue_rows(rows: Vec<IssueRecord>) -> Vec<IssueRecord> {
    dedupe_last(rows, issue_key)
}

/// Deduplicate stargazer events on `(repository, user)`: the first star
/// wins, so a later re-observation never overwrites the original instant.
pub fn dedupe_stargazers(mut rows: Vec<StargazerRecord>) -> Vec<StargazerRecord> {
    rows.sort_by_key(|row| row.starred_at);
    dedupe_first(rows, |row| (row.repository.clone(), row.profile.user.clone()))
}

/// Collapse profile rows to one per `user`, keeping the freshest
/// `user_updated_at`. Undated rows lose to dated ones.
pub fn dedupe_profiles(mut rows: Vec<ProfileRecord>) -> Vec<ProfileRecord> {
    rows.sort_by_key(|row| row.user_updated_at);
    dedupe_last(rows, |row| row.user.clone())
}

fn issue_key(row: &IssueRecord) -> (String, i64) {
    (row.repository.clone(), row.number)
}

fn issue_order(row: &IssueRecord) -> (NaiveDateTime, bool, NaiveDateTime) {
    // Still-open rows order after closed ones sharing a created_at.
    (
        row.created_at,
        row.closed_at.is_none(),
        row.closed_at.unwrap_or(NaiveDateTime::MIN),
    )
}

fn dedupe_last<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut last_index: HashMap<K, usize> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        last_index.insert(key(row), index);
    }
    rows.into_iter()
        .enumerate()
        .filter(|(index, row)| last_index.get(&key(row)) == Some(index))
        .map(|(_, row)| row)
        .collect()
}

fn dedupe_first<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(key(row))).collect()
}
