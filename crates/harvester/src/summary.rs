//! Derived tables: pure aggregation over the merged entity tables.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use records::models::{IssueRecord, ProfileRecord, StargazerRecord};
use serde::{Deserialize, Serialize};

/// One row per issue author, profile attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueUserRow {
    pub first_issue_date: NaiveDateTime,
    /// Days between account creation and the first opened issue.
    pub account_age_days: Option<i64>,
    pub opened_issues: i64,
    pub num_repositories: i64,
    #[serde(flatten)]
    pub profile: ProfileRecord,
}

/// One row per pull-request author, profile attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorRow {
    pub first_pr_date: NaiveDateTime,
    pub opened_prs: i64,
    pub num_repositories: i64,
    #[serde(flatten)]
    pub profile: ProfileRecord,
}

/// One row per stargazer, anchored to the earliest observed star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StargazerSummaryRow {
    pub starred_at: NaiveDateTime,
    pub starred_repositories: i64,
    pub first_starred_repository: String,
    #[serde(flatten)]
    pub profile: ProfileRecord,
}

struct AuthorStats {
    first_date: NaiveDateTime,
    opened: i64,
    repositories: BTreeSet<String>,
}

fn author_stats(rows: &[IssueRecord]) -> BTreeMap<String, AuthorStats> {
    let mut stats: BTreeMap<String, AuthorStats> = BTreeMap::new();
    for row in rows {
        let Some(user) = &row.user else { continue };
        let entry = stats.entry(user.clone()).or_insert_with(|| AuthorStats {
            first_date: row.created_at,
            opened: 0,
            repositories: BTreeSet::new(),
        });
        entry.first_date = entry.first_date.min(row.created_at);
        entry.opened += 1;
        entry.repositories.insert(row.repository.clone());
    }
    stats
}

fn lookup(directory: &HashMap<&str, &ProfileRecord>, user: &str) -> ProfileRecord {
    directory
        .get(user)
        .map(|profile| (*profile).clone())
        .unwrap_or_else(|| ProfileRecord::bare(user))
}

pub fn issue_users(issues: &[IssueRecord], profiles: &[ProfileRecord]) -> Vec<IssueUserRow> {
    let directory: HashMap<&str, &ProfileRecord> = profiles
        .iter()
        .map(|profile| (profile.user.as_str(), profile))
        .collect();

    let mut rows: Vec<IssueUserRow> = author_stats(issues)
        .into_iter()
        .map(|(user, stats)| {
            let profile = lookup(&directory, &user);
            let account_age_days = profile
                .user_created_at
                .map(|created| (stats.first_date - created).num_days());
            IssueUserRow {
                first_issue_date: stats.first_date,
                account_age_days,
                opened_issues: stats.opened,
                num_repositories: stats.repositories.len() as i64,
                profile,
            }
        })
        .collect();
    rows.sort_by_key(|row| row.first_issue_date);
    rows
}

pub fn contributors(
    pull_requests: &[IssueRecord],
    profiles: &[ProfileRecord],
) -> Vec<ContributorRow> {
    let directory: HashMap<&str, &ProfileRecord> = profiles
        .iter()
        .map(|profile| (profile.user.as_str(), profile))
        .collect();

    let mut rows: Vec<ContributorRow> = author_stats(pull_requests)
        .into_iter()
        .map(|(user, stats)| ContributorRow {
            first_pr_date: stats.first_date,
            opened_prs: stats.opened,
            num_repositories: stats.repositories.len() as i64,
            profile: lookup(&directory, &user),
        })
        .collect();
    rows.sort_by_key(|row| row.first_pr_date);
    rows
}

/// Collapse stargazer events to one row per user. Events arrive deduped on
/// `(repository, user)` and sorted by `starred_at`, so the first event seen
/// per user is the earliest star.
pub fn top_stargazers(stargazers: &[StargazerRecord]) -> Vec<StargazerSummaryRow> {
    let mut per_user: BTreeMap<&str, StargazerSummaryRow> = BTreeMap::new();
    for event in stargazers {
        match per_user.get_mut(event.profile.user.as_str()) {
            Some(row) => row.starred_repositories += 1,
            None => {
                per_user.insert(
                    event.profile.user.as_str(),
                    StargazerSummaryRow {
                        starred_at: event.starred_at,
                        starred_repositories: 1,
                        first_starred_repository: event.repository.clone(),
                        profile: event.profile.clone(),
                    },
                );
            }
        }
    }

    let mut rows: Vec<StargazerSummaryRow> = per_user.into_values().collect();
    rows.sort_by_key(|row| row.starred_at);
    rows
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 6, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn issue(repository: &str, user: &str, number: i64, created: NaiveDateTime) -> IssueRecord {
        IssueRecord {
            repository: repository.into(),
            user: Some(user.into()),
            number,
            comments: 0,
            created_at: created,
            updated_at: created,
            closed_at: None,
            state: "OPEN".into(),
            title: String::new(),
        }
    }

    #[test]
    fn issue_users_aggregate_per_author() {
        let issues = vec![
            issue("octo/one", "alice", 1, ts(3)),
            issue("octo/one", "alice", 2, ts(1)),
            issue("octo/two", "alice", 1, ts(2)),
            issue("octo/one", "bob", 3, ts(4)),
        ];
        let mut alice = ProfileRecord::bare("alice");
        alice.user_created_at = Some(ts(1) - chrono::Duration::days(10));

        let rows = issue_users(&issues, &[alice]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].profile.user, "alice");
        assert_eq!(rows[0].first_issue_date, ts(1));
        assert_eq!(rows[0].opened_issues, 3);
        assert_eq!(rows[0].num_repositories, 2);
        assert_eq!(rows[0].account_age_days, Some(10));
        // bob has no directory entry; a bare profile fills in
        assert_eq!(rows[1].profile.user, "bob");
        assert_eq!(rows[1].account_age_days, None);
    }

    #[test]
    fn authorless_rows_do_not_aggregate() {
        let mut ghost = issue("octo/one", "x", 9, ts(1));
        ghost.user = None;
        assert!(issue_users(&[ghost], &[]).is_empty());
    }

    #[test]
    fn stargazer_summary_counts_repositories_per_user() {
        let events = vec![
            StargazerRecord {
                repository: "octo/one".into(),
                starred_at: ts(1),
                profile: ProfileRecord::bare("alice"),
            },
            StargazerRecord {
                repository: "octo/two".into(),
                starred_at: ts(5),
                profile: ProfileRecord::bare("alice"),
            },
            StargazerRecord {
                repository: "octo/one".into(),
                starred_at: ts(2),
                profile: ProfileRecord::bare("bob"),
            },
        ];

        let rows = top_stargazers(&events);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].profile.user, "alice");
        assert_eq!(rows[0].starred_repositories, 2);
        assert_eq!(rows[0].first_starred_repository, "octo/one");
        assert_eq!(rows[0].starred_at, ts(1));
    }
}
