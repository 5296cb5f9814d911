//! Per-project orchestration: owner expansion, per-repository harvesting
//! with watermark narrowing, and assembly of the merged table set.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use common::config::HarvestConfig;
use records::models::{IssueRecord, ProfileRecord, StargazerRecord};
use records::parse;
use tracing::{info, instrument, warn};

use crate::client::GithubTransport;
use crate::merge;
use crate::pagination::paginate;
use crate::profiles;
use crate::progress::ProgressMode;
use crate::query;
use crate::store::TableSet;
use crate::summary;

pub struct Collector {
    config: HarvestConfig,
    transport: Arc<dyn GithubTransport>,
    progress: ProgressMode,
}

struct RepoHarvest {
    issues: Vec<IssueRecord>,
    pull_requests: Vec<IssueRecord>,
    stargazers: Vec<StargazerRecord>,
}

impl Collector {
    pub fn new(config: HarvestConfig, transport: Arc<dyn GithubTransport>) -> Self {
        let progress = ProgressMode::detect(config.quiet);
        Self {
            config,
            transport,
            progress,
        }
    }

    /// Harvest every repository of one project and merge the result with
    /// the previous snapshot. One repository's failure is logged and
    /// skipped; results from completed repositories are retained.
    #[instrument(skip(self, repositories, previous))]
    pub async fn collect_project(
        &self,
        project: &str,
        repositories: &[String],
        previous: Option<&TableSet>,
    ) -> Result<TableSet> {
        let mut all_issues = Vec::new();
        let mut all_pull_requests = Vec::new();
        let mut all_stargazers = Vec::new();

        for repository in self.expand_targets(repositories).await {
            match self.harvest_repository(&repository, previous).await {
                Ok(harvest) => {
                    all_issues.extend(harvest.issues);
                    all_pull_requests.extend(harvest.pull_requests);
                    all_stargazers.extend(harvest.stargazers);
                }
                Err(err) => {
                    warn!(repository = %repository, error = ?err, "failed to harvest repository");
                }
            }
        }

        let profiles = profiles::resolve(
            self.transport.as_ref(),
            &all_issues,
            &all_pull_requests,
            &all_stargazers,
            previous,
            self.config.page_size,
            self.progress,
        )
        .await?;

        Ok(assemble(
            all_issues,
            all_pull_requests,
            all_stargazers,
            profiles,
        ))
    }

    /// `owner/name` entries pass through; bare owners expand to all their
    /// non-fork repositories. A failed expansion is logged and skipped.
    async fn expand_targets(&self, repositories: &[String]) -> Vec<String> {
        let mut targets = Vec::new();
        for entry in repositories {
            if entry.contains('/') {
                targets.push(entry.clone());
                continue;
            }
            match self.owner_repositories(entry).await {
                Ok(expanded) => targets.extend(expanded),
                Err(err) => {
                    warn!(owner = %entry, error = ?err, "failed to expand repository owner");
                }
            }
        }
        targets
    }

    async fn owner_repositories(&self, owner: &str) -> Result<Vec<String>> {
        let query = query::repositories(owner, self.config.page_size);
        let mut progress = self.progress.sink();
        let listings = paginate(
            self.transport.as_ref(),
            &query,
            |edge| parse::repository(owner, edge),
            progress.as_mut(),
        )
        .await
        .with_context(|| format!("listing repositories of {owner}"))?;
        Ok(listings
            .into_iter()
            .map(|listing| listing.repository)
            .collect())
    }

    async fn harvest_repository(
        &self,
        repository: &str,
        previous: Option<&TableSet>,
    ) -> Result<RepoHarvest> {
        let (owner, name) = repository
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository name: {repository}"))?;

        let prior_issues: Vec<IssueRecord> = previous
            .map(|tables| {
                tables
                    .issues
                    .iter()
                    .filter(|row| row.repository == repository)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let watermark = merge::watermark(&prior_issues);
        info!(repository, since = ?watermark, "harvesting repository");

        // Issues narrow by the watermark; pull requests and stargazers are
        // always refetched in full.
        let issues_query = query::issues(owner, name, self.config.page_size, watermark);
        let fresh_issues = {
            let mut progress = self.progress.sink();
            paginate(
                self.transport.as_ref(),
                &issues_query,
                |edge| parse::issue(repository, edge),
                progress.as_mut(),
            )
            .await
            .with_context(|| format!("fetching issues for {repository}"))?
        };
        let issues = merge::merge_issues(prior_issues, fresh_issues);

        let pr_query = query::pull_requests(owner, name, self.config.page_size);
        let pull_requests = {
            let mut progress = self.progress.sink();
            paginate(
                self.transport.as_ref(),
                &pr_query,
                |edge| parse::issue(repository, edge),
                progress.as_mut(),
            )
            .await
            .with_context(|| format!("fetching pull requests for {repository}"))?
        };

        let star_query = query::stargazers(owner, name, self.config.page_size);
        let stargazers = {
            let mut progress = self.progress.sink();
            paginate(
                self.transport.as_ref(),
                &star_query,
                |edge| parse::stargazer(repository, edge),
                progress.as_mut(),
            )
            .await
            .with_context(|| format!("fetching stargazers for {repository}"))?
        };

        Ok(RepoHarvest {
            issues,
            pull_requests,
            stargazers,
        })
    }
}

fn assemble(
    issues: Vec<IssueRecord>,
    pull_requests: Vec<IssueRecord>,
    stargazers: Vec<StargazerRecord>,
    profiles: Vec<ProfileRecord>,
) -> TableSet {
    let mut issues = issues;
    issues.sort_by_key(|row| row.created_at);

    let mut pull_requests = merge::dedupe_issue_rows(pull_requests);
    pull_requests.sort_by_key(|row| row.created_at);

    let stargazers = merge::dedupe_stargazers(stargazers);

    let issue_users = summary::issue_users(&issues, &profiles);
    let contributors = summary::contributors(&pull_requests, &profiles);
    let top_stargazers = summary::top_stargazers(&stargazers);

    TableSet {
        issues,
        pull_requests,
        stargazers,
        profiles,
        issue_users,
        contributors,
        top_stargazers,
    }
}
