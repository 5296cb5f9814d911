use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::error;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub github: GithubConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub projects: BTreeMap<String, Vec<String>>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(".")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/default")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/local")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Resolve the requested project names against the configured map.
    /// Unknown names are reported and skipped so the run continues for the
    /// rest; an empty request selects every configured project.
    pub fn select_projects(&self, requested: &[String]) -> BTreeMap<String, Vec<String>> {
        if requested.is_empty() {
            return self.projects.clone();
        }

        let mut selected = BTreeMap::new();
        for name in requested {
            match self.projects.get(name) {
                Some(repositories) => {
                    selected.insert(name.clone(), repositories.clone());
                }
                None => error!(project = %name, "unknown project in configuration"),
            }
        }
        selected
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    pub token: String,
    #[serde(default = "GithubConfig::default_user_agent")]
    pub user_agent: String,
}

impl GithubConfig {
    fn default_user_agent() -> String {
        "gh-harvest".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    #[serde(default = "HarvestConfig::default_incremental")]
    pub incremental: bool,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default = "HarvestConfig::default_page_size")]
    pub page_size: u32,
}

impl HarvestConfig {
    const fn default_incremental() -> bool {
        true
    }

    const fn default_page_size() -> u32 {
        100
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            incremental: Self::default_incremental(),
            quiet: false,
            page_size: Self::default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_folder")]
    pub folder: String,
}

impl OutputConfig {
    fn default_folder() -> String {
        ".".to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: Self::default_folder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AppConfig {
        AppConfig {
            github: GithubConfig {
                token: "t".into(),
                user_agent: "ua".into(),
            },
            harvest: HarvestConfig::default(),
            output: OutputConfig::default(),
            projects: BTreeMap::from([
                ("alpha".to_string(), vec!["octo/alpha".to_string()]),
                ("beta".to_string(), vec!["octo/beta".to_string()]),
            ]),
        }
    }

    #[test]
    fn empty_request_selects_all_projects() {
        let config = sample_config();
        let selected = config.select_projects(&[]);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn unknown_project_is_skipped() {
        let config = sample_config();
        let selected =
            config.select_projects(&["alpha".to_string(), "does-not-exist".to_string()]);
        assert_eq!(selected.len(), 1);
        assert!(selected.contains_key("alpha"));
    }
}
