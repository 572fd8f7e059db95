//! Turns a scheduled [`WorkItem`] into a concrete, installation-scoped
//! [`ReviewWarden`] call. Shared by the webhook-triggered fast path and the
//! periodic poll loop — both only ever enqueue work, they never call the
//! warden directly.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use review_warden_core::scheduler::{run_with_retry, WorkItem};
use review_warden_core::ReviewWarden;
use review_warden_forge::auth;
use review_warden_forge::github::GitHubForge;

use crate::state::AppState;

/// How long a single work item may keep retrying transient failures
/// before `process` gives up and logs it for the next poll/webhook
/// delivery to pick back up.
const RETRY_BUDGET: Duration = Duration::from_secs(300);

/// Authenticates as `installation_id` for `repo` and builds the
/// [`ReviewWarden`] that will act on it. A fresh token is minted every
/// time rather than cached, since installation tokens are short-lived and
/// work items are not frequent enough for that to matter.
#[instrument(skip(state))]
async fn warden_for(state: &AppState, repo: &str, installation_id: u64) -> Option<ReviewWarden> {
    let (owner, name) = repo.split_once('/')?;

    let scoped = match auth::authenticate_with_access_token(&state.app_client, installation_id, owner, name).await {
        Ok(client) => client,
        Err(e) => {
            error!(repo, installation_id, error = %e, "failed to authenticate for installation");
            return None;
        }
    };

    let forge = Arc::new(GitHubForge::new(scoped));

    Some(ReviewWarden::new(
        forge,
        state.census.clone(),
        state.jcheck.clone(),
        state.git.clone(),
        state.issue_tracker.clone(),
    ))
}

/// Processes one work item to completion, logging but never propagating
/// failure — a bad item must not take down the worker that drains it.
#[instrument(skip(state, item))]
pub async fn process(state: Arc<AppState>, item: WorkItem) {
    let repo = match &item {
        WorkItem::Check { repo, .. } => repo.clone(),
        WorkItem::CommitCommand { repo, .. } => repo.clone(),
    };

    let installation_id = match state.installations.read().await.get(&repo).copied() {
        Some(id) => id,
        None => {
            warn!(repo, "no known installation for repository, dropping work item");
            return;
        }
    };

    let Some(warden) = warden_for(&state, &repo, installation_id).await else {
        return;
    };

    match item {
        WorkItem::Check { repo, pr_number, revision } => {
            let result = run_with_retry(RETRY_BUDGET, || warden.check_pull_request(&repo, pr_number)).await;
            match result {
                Ok(outcome) => info!(
                    repo,
                    pr_number,
                    revision,
                    replies_posted = outcome.replies_posted,
                    integration_attempted = outcome.integration_attempted,
                    "reconciled pull request"
                ),
                Err(e) => error!(repo, pr_number, error = %e, "failed to reconcile pull request"),
            }
        }
        WorkItem::CommitCommand { repo, commit_hash, comment_id } => {
            let result = run_with_retry(RETRY_BUDGET, || warden.handle_commit_comment(&repo, &commit_hash)).await;
            match result {
                Ok(replies) => info!(repo, commit_hash, comment_id, replies, "handled commit comment"),
                Err(e) => error!(repo, commit_hash, comment_id, error = %e, "failed to handle commit comment"),
            }
        }
    }
}
