//! Periodic poll loop (§4.1): the scheduler's other source of work,
//! alongside the webhook fast path. Covers repositories that the webhook
//! never reached (a delivery was dropped, or the process was down) and is
//! the only source of work for commit comments on repositories with no
//! live webhook configured at all.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

use review_warden_core::scheduler::{reconcile_queue, WorkItem};
use review_warden_forge::auth;
use review_warden_forge::github::GitHubForge;
use review_warden_forge::ForgeClient;

use crate::state::AppState;

/// Spawns the poll loop on the current runtime. Returns the join handle so
/// the caller can abort it on shutdown.
pub fn spawn(state: Arc<AppState>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let since = Mutex::new(Utc::now());

        loop {
            ticker.tick().await;
            let from = {
                let mut guard = since.lock().await;
                let from = *guard;
                *guard = Utc::now();
                from
            };
            tick(&state, from).await;
        }
    })
}

#[instrument(skip(state))]
async fn tick(state: &AppState, since: chrono::DateTime<Utc>) {
    for (repo, installation_id) in state.known_repositories().await {
        if let Err(e) = poll_repository(state, &repo, installation_id, since).await {
            error!(repo, error = %e, "poll tick failed for repository");
        }
    }
}

async fn poll_repository(
    state: &AppState,
    repo: &str,
    installation_id: u64,
    since: chrono::DateTime<Utc>,
) -> Result<(), review_warden_forge::errors::Error> {
    let Some((owner, name)) = repo.split_once('/') else {
        warn!(repo, "malformed repository full name, skipping poll");
        return Ok(());
    };

    let scoped = auth::authenticate_with_access_token(&state.app_client, installation_id, owner, name).await?;
    let forge = GitHubForge::new(scoped);

    let prs = forge.list_updated_pull_requests(repo, since).await?;
    let commit_comments = forge.list_new_commit_comments(repo, since).await?;
    let discovered = build_work_items(repo, prs, commit_comments);

    debug!(repo, count = discovered.len(), "poll tick discovered work");

    let queued = state.pool.queued_items();
    let running = state.pool.running_keys();
    for item in reconcile_queue(discovered, &queued, &running) {
        if let Err(e) = state.pool.submit(item).await {
            warn!(repo, error = %e, "failed to submit discovered work item");
        }
    }

    Ok(())
}

fn build_work_items(
    repo: &str,
    prs: Vec<review_warden_forge::models::PullRequest>,
    commit_comments: Vec<(review_warden_forge::models::Commit, review_warden_forge::models::CommitComment)>,
) -> Vec<WorkItem> {
    prs.into_iter()
        .map(|pr| WorkItem::Check {
            repo: repo.to_string(),
            pr_number: pr.number,
            revision: pr.head_hash,
        })
        .chain(commit_comments.into_iter().map(|(commit, comment)| WorkItem::CommitCommand {
            repo: repo.to_string(),
            commit_hash: commit.hash,
            comment_id: comment.id,
        }))
        .collect()
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
