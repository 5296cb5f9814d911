//! Snapshot persistence: one JSON document per project, one table per
//! entity type plus the derived tables.

use std::path::Path;

use anyhow::{Context, Result};
use records::models::{IssueRecord, ProfileRecord, StargazerRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::summary::{ContributorRow, IssueUserRow, StargazerSummaryRow};

/// The persisted table set for one project. Entity tables are keyed the way
/// the merge step expects; derived tables are outputs only and are never
/// consulted when merging. Missing tables deserialize to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub pull_requests: Vec<IssueRecord>,
    #[serde(default)]
    pub stargazers: Vec<StargazerRecord>,
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
    #[serde(default)]
    pub issue_users: Vec<IssueUserRow>,
    #[serde(default)]
    pub contributors: Vec<ContributorRow>,
    #[serde(default)]
    pub top_stargazers: Vec<StargazerSummaryRow>,
}

/// Load the previous snapshot. A missing file is a first run, not an error:
/// the caller falls back to a full fetch.
pub async fn load(path: &Path) -> Result<Option<TableSet>> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("reading snapshot {}", path.display()))
        }
    };
    let tables = serde_json::from_str(&data)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(Some(tables))
}

pub async fn save(path: &Path, tables: &TableSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(tables)?;
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("writing snapshot {}", path.display()))?;
    info!(path = %path.display(), "snapshot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sample() -> TableSet {
        let created = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TableSet {
            issues: vec![IssueRecord {
                repository: "octo/example".into(),
                user: Some("alice".into()),
                number: 1,
                comments: 0,
                created_at: created,
                updated_at: created,
                closed_at: None,
                state: "OPEN".into(),
                title: "First".into(),
            }],
            profiles: vec![ProfileRecord::bare("alice")],
            ..TableSet::default()
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");

        let tables = sample();
        save(&path, &tables).await.unwrap();
        let loaded = load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, tables);
    }

    #[tokio::test]
    async fn missing_file_is_a_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load(&dir.path().join("absent.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/project.json");
        save(&path, &TableSet::default()).await.unwrap();
        assert!(load(&path).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_tables_deserialize_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        tokio::fs::write(&path, r#"{ "issues": [] }"#).await.unwrap();
        let loaded = load(&path).await.unwrap().unwrap();
        assert!(loaded.profiles.is_empty());
    }
}
