//! Per-repository bot configuration.
//!
//! Parsed from `.forge-bot/config.toml` via [`review_warden_forge::ConfigFetcher`],
//! with [`ApplicationDefaults`] filling in anything the file omits or the
//! file being entirely absent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;
use review_warden_forge::ConfigFetcher;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// `label → ordered list of path regexes`, per §6/§3 `LabelConfiguration`.
pub type LabelConfiguration = HashMap<String, Vec<String>>;

/// The raw, all-optional shape of `.forge-bot/config.toml`. Every field
/// mirrors one of the enumerated options in §6.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(rename = "censusRepo")]
    pub census_repo: Option<String>,
    #[serde(rename = "censusLink")]
    pub census_link: Option<String>,
    #[serde(rename = "issueProject")]
    pub issue_project: Option<String>,
    #[serde(rename = "labelConfiguration")]
    pub label_configuration: Option<LabelConfiguration>,
    #[serde(rename = "externalPullRequestCommands")]
    pub external_pull_request_commands: Option<Vec<String>>,
    #[serde(rename = "externalCommitCommands")]
    pub external_commit_commands: Option<Vec<String>>,
    #[serde(rename = "seedStorage")]
    pub seed_storage: Option<String>,
    pub forks: Option<HashMap<String, String>>,
    #[serde(rename = "processPR")]
    pub process_pr: Option<bool>,
    #[serde(rename = "processCommit")]
    pub process_commit: Option<bool>,
    #[serde(rename = "enableCsr")]
    pub enable_csr: Option<bool>,
    #[serde(rename = "useStaleReviews")]
    pub use_stale_reviews: Option<bool>,
    pub integrators: Option<Vec<String>>,
}

/// The fully resolved, always-present configuration the rest of the core
/// operates on: [`RootConfig`] merged onto hard-coded defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDefaults {
    pub census_repo: String,
    pub census_link: String,
    pub issue_project: Option<String>,
    pub label_configuration: LabelConfiguration,
    pub external_pull_request_commands: Vec<String>,
    pub external_commit_commands: Vec<String>,
    pub seed_storage: String,
    pub forks: HashMap<String, String>,
    pub process_pr: bool,
    pub process_commit: bool,
    pub enable_csr: bool,
    pub use_stale_reviews: bool,
    pub integrators: Vec<String>,
}

impl Default for ApplicationDefaults {
    fn default() -> Self {
        Self {
            census_repo: "census".to_string(),
            census_link: "https://github.com/openjdk/census#{{contributor}}".to_string(),
            issue_project: None,
            label_configuration: HashMap::new(),
            external_pull_request_commands: Vec::new(),
            external_commit_commands: Vec::new(),
            seed_storage: "/var/lib/review-warden/seeds".to_string(),
            forks: HashMap::new(),
            process_pr: true,
            process_commit: true,
            enable_csr: false,
            use_stale_reviews: false,
            integrators: Vec::new(),
        }
    }
}

impl ApplicationDefaults {
    /// Applies a parsed [`RootConfig`] on top of the defaults, field by field.
    pub fn merge(mut self, overrides: RootConfig) -> Self {
        if let Some(v) = overrides.census_repo {
            self.census_repo = v;
        }
        if let Some(v) = overrides.census_link {
            self.census_link = v;
        }
        if overrides.issue_project.is_some() {
            self.issue_project = overrides.issue_project;
        }
        if let Some(v) = overrides.label_configuration {
            self.label_configuration = v;
        }
        if let Some(v) = overrides.external_pull_request_commands {
            self.external_pull_request_commands = v;
        }
        if let Some(v) = overrides.external_commit_commands {
            self.external_commit_commands = v;
        }
        if let Some(v) = overrides.seed_storage {
            self.seed_storage = v;
        }
        if let Some(v) = overrides.forks {
            self.forks = v;
        }
        if let Some(v) = overrides.process_pr {
            self.process_pr = v;
        }
        if let Some(v) = overrides.process_commit {
            self.process_commit = v;
        }
        if let Some(v) = overrides.enable_csr {
            self.enable_csr = v;
        }
        if let Some(v) = overrides.use_stale_reviews {
            self.use_stale_reviews = v;
        }
        if let Some(v) = overrides.integrators {
            self.integrators = v;
        }
        self
    }
}

/// Parses raw TOML bytes into a [`RootConfig`].
pub fn parse_config(raw: &[u8]) -> Result<RootConfig, CoreError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| CoreError::Fatal(format!("config file is not valid UTF-8: {e}")))?;
    toml::from_str(text).map_err(|e| CoreError::Fatal(format!("invalid bot config: {e}")))
}

/// Fetches and resolves `repo`'s bot configuration, falling back to
/// [`ApplicationDefaults`] when the file is absent.
///
/// A present-but-invalid file is a [`CoreError::Fatal`]: silently falling
/// back would hide a project's misconfiguration instead of surfacing it.
pub async fn load_config(
    fetcher: &(impl ConfigFetcher + ?Sized),
    repo: &str,
) -> Result<ApplicationDefaults, CoreError> {
    match fetcher.fetch_config(repo).await? {
        Some(raw) => {
            let overrides = parse_config(&raw)?;
            Ok(ApplicationDefaults::default().merge(overrides))
        }
        None => Ok(ApplicationDefaults::default()),
    }
}
