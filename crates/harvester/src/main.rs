use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use common::{config::AppConfig, logging};
use harvester::client::HttpTransport;
use harvester::service::Collector;
use harvester::store;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("info");
    let config = AppConfig::load()?;

    let requested: Vec<String> = std::env::args().skip(1).collect();
    let projects = config.select_projects(&requested);
    if projects.is_empty() {
        warn!("no projects selected; nothing to do");
        return Ok(());
    }

    let transport: Arc<dyn harvester::GithubTransport> = Arc::new(HttpTransport::new(
        config.github.token.clone(),
        config.github.user_agent.clone(),
    ));
    let collector = Collector::new(config.harvest.clone(), transport);

    let output = PathBuf::from(&config.output.folder);
    for (project, repositories) in projects {
        if let Err(err) = run_project(
            &collector,
            &output,
            &project,
            &repositories,
            config.harvest.incremental,
        )
        .await
        {
            warn!(project = %project, error = ?err, "failed to collect project");
        }
    }
    Ok(())
}

async fn run_project(
    collector: &Collector,
    output: &Path,
    project: &str,
    repositories: &[String],
    incremental: bool,
) -> Result<()> {
    let path = output.join(format!("{project}.json"));
    let previous = if incremental {
        store::load(&path).await?
    } else {
        None
    };
    info!(
        project,
        repositories = repositories.len(),
        incremental = previous.is_some(),
        "collecting project"
    );

    let tables = collector
        .collect_project(project, repositories, previous.as_ref())
        .await?;
    store::save(&path, &tables).await
}
