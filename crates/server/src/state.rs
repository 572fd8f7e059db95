//! Shared server state: the app-level forge client used to mint
//! per-installation tokens, the collaborators every [`ReviewWarden`] needs,
//! and the registry of repositories the poll loop has learned about from
//! webhook deliveries.

use std::collections::HashMap;
use std::sync::Arc;

use octocrab::Octocrab;
use tokio::sync::RwLock;

use review_warden_core::jcheck::JcheckFacade;
use review_warden_core::scheduler::WorkerPool;
use review_warden_forge::census::CensusRepository;
use review_warden_forge::git::GitPlumbing;
use review_warden_forge::issues::IssueTrackerClient;
use review_warden_forge::models::User;

/// Everything a webhook handler or poll tick needs to act on a repository.
pub struct AppState {
    /// App-level client, used to exchange an installation id for a
    /// repo-scoped token on each work item (installations are not
    /// long-lived, so a fresh token is minted per use).
    pub app_client: Octocrab,

    /// The bot's own identity, used to recognize its own comments.
    pub bot_user: User,

    /// Secret configured on the GitHub App's webhook, for signature checks.
    pub webhook_secret: String,

    /// Collaborators shared across every installation; only the forge
    /// client varies per repository.
    pub census: Arc<dyn CensusRepository>,
    pub jcheck: Arc<dyn JcheckFacade>,
    pub git: Arc<dyn GitPlumbing>,
    pub issue_tracker: Option<Arc<dyn IssueTrackerClient>>,

    /// `repo full_name -> installation id`, learned from webhook
    /// deliveries. The poll loop only covers repositories already present
    /// here; a repository the app was just installed into is picked up as
    /// soon as its first webhook event arrives.
    pub installations: RwLock<HashMap<String, u64>>,

    /// Bounded worker pool draining the shared work queue.
    pub pool: WorkerPool,
}

impl AppState {
    /// Records (or refreshes) the installation id a repository is
    /// reachable through.
    pub async fn remember_installation(&self, repo_full_name: &str, installation_id: u64) {
        self.installations
            .write()
            .await
            .insert(repo_full_name.to_string(), installation_id);
    }

    /// Returns every repository the poll loop currently knows about.
    pub async fn known_repositories(&self) -> Vec<(String, u64)> {
        self.installations
            .read()
            .await
            .iter()
            .map(|(repo, id)| (repo.clone(), *id))
            .collect()
    }
}
