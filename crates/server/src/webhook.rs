//! GitHub webhook intake: signature verification and payload parsing for
//! the event types the scheduler cares about. Successful deliveries only
//! ever enqueue a [`WorkItem`]; they never call the forge inline, so the
//! HTTP response doesn't wait on GitHub API latency.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info, instrument, warn};

use review_warden_core::scheduler::{reconcile_queue, WorkItem};
use review_warden_forge::models::{Installation, Repository};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PullRequestRef {
    number: u64,
    head: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitCommentRef {
    id: u64,
    commit_id: String,
}

#[derive(Debug, Deserialize)]
struct CommitCommentPayload {
    action: String,
    installation: Option<Installation>,
    repository: Option<Repository>,
    comment: Option<CommitCommentRef>,
}

/// The subset of GitHub's `pull_request` webhook event this bot acts on.
#[derive(Debug, Deserialize)]
struct PullRequestEventPayload {
    action: String,
    installation: Option<Installation>,
    repository: Option<Repository>,
    pull_request: Option<PullRequestRef>,
}

/// Actions that can change the declarative surface the state machine
/// computes from; anything else (e.g. `assigned`, `locked`) is a no-op.
const RELEVANT_PR_ACTIONS: &[&str] = &[
    "opened",
    "edited",
    "reopened",
    "synchronize",
    "ready_for_review",
    "converted_to_draft",
    "labeled",
    "unlabeled",
    "review_requested",
];

/// Health check endpoint; used by the operator's load balancer/orchestrator.
#[instrument(skip_all)]
pub async fn health(State(_state): State<Arc<AppState>>) -> StatusCode {
    StatusCode::OK
}

/// Handles `pull_request`, `issue_comment`, `pull_request_review`, and
/// `commit_comment` deliveries. Dispatches by the `X-GitHub-Event` header,
/// since the JSON shape differs per event type.
#[instrument(skip(state, headers, body))]
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, StatusCode> {
    if !verify_signature(&state.webhook_secret, &headers, &body) {
        warn!("webhook delivery failed signature verification");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let event = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    debug!(event, "verified webhook delivery");

    match event.as_str() {
        "pull_request" => handle_pull_request_event(&state, &body).await,
        "commit_comment" => handle_commit_comment_event(&state, &body).await,
        "issue_comment" | "pull_request_review" | "pull_request_review_comment" => {
            handle_comment_like_event(&state, &body).await
        }
        other => {
            debug!(event = other, "ignoring unhandled event type");
            Ok(StatusCode::OK)
        }
    }
}

async fn handle_pull_request_event(state: &AppState, body: &str) -> Result<StatusCode, StatusCode> {
    let payload: PullRequestEventPayload = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "could not parse pull_request webhook payload");
        StatusCode::BAD_REQUEST
    })?;

    if !RELEVANT_PR_ACTIONS.contains(&payload.action.as_str()) {
        debug!(action = payload.action, "pull request action requires no reconciliation");
        return Ok(StatusCode::OK);
    }

    let (Some(installation), Some(repository), Some(pr)) =
        (payload.installation, payload.repository, payload.pull_request)
    else {
        warn!("pull_request webhook payload missing installation, repository, or pull_request");
        return Err(StatusCode::BAD_REQUEST);
    };

    state.remember_installation(&repository.full_name, installation.id).await;

    info!(repo = repository.full_name, pr_number = pr.number, "enqueuing pull request check");
    submit(state, WorkItem::Check {
        repo: repository.full_name,
        pr_number: pr.number,
        revision: pr.head.sha,
    })
    .await
}

/// `issue_comment` (PR comments are issue comments on GitHub) and PR
/// review events both carry a command the PR might need re-evaluating
/// for; re-check the whole PR rather than special-casing comment bodies
/// here, since the dispatcher replays the full comment history anyway.
async fn handle_comment_like_event(state: &AppState, body: &str) -> Result<StatusCode, StatusCode> {
    #[derive(Debug, Deserialize)]
    struct IssueRef {
        number: u64,
        pull_request: Option<serde_json::Value>,
    }

    #[derive(Debug, Deserialize)]
    struct Payload {
        action: String,
        installation: Option<Installation>,
        repository: Option<Repository>,
        issue: Option<IssueRef>,
        pull_request: Option<PullRequestRef>,
    }

    let payload: Payload = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "could not parse comment-like webhook payload");
        StatusCode::BAD_REQUEST
    })?;

    if payload.action != "created" && payload.action != "submitted" {
        return Ok(StatusCode::OK);
    }

    let Some(repository) = payload.repository else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let Some(installation) = payload.installation else {
        return Err(StatusCode::BAD_REQUEST);
    };

    let pr_number = match (payload.issue, payload.pull_request) {
        (Some(issue), _) if issue.pull_request.is_some() => issue.number,
        (_, Some(pr)) => pr.number,
        _ => {
            debug!("comment-like event was not on a pull request, ignoring");
            return Ok(StatusCode::OK);
        }
    };

    state.remember_installation(&repository.full_name, installation.id).await;

    info!(repo = repository.full_name, pr_number, "enqueuing pull request check for new comment");
    submit(state, WorkItem::Check {
        repo: repository.full_name,
        pr_number,
        revision: String::new(),
    })
    .await
}

async fn handle_commit_comment_event(state: &AppState, body: &str) -> Result<StatusCode, StatusCode> {
    let payload: CommitCommentPayload = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "could not parse commit_comment webhook payload");
        StatusCode::BAD_REQUEST
    })?;

    if payload.action != "created" {
        return Ok(StatusCode::OK);
    }

    let (Some(installation), Some(repository)) = (payload.installation, payload.repository) else {
        return Err(StatusCode::BAD_REQUEST);
    };

    let Some(comment) = payload.comment else {
        warn!("commit_comment webhook payload missing the comment body");
        return Err(StatusCode::BAD_REQUEST);
    };

    state.remember_installation(&repository.full_name, installation.id).await;

    info!(repo = repository.full_name, commit_hash = comment.commit_id, comment_id = comment.id, "enqueuing commit comment dispatch");
    submit(state, WorkItem::CommitCommand {
        repo: repository.full_name,
        commit_hash: comment.commit_id,
        comment_id: comment.id,
    })
    .await
}

/// Reconciles `item` against what the pool already has queued or running
/// before handing it off, the same coalescing the poll loop applies to its
/// own batch, so a burst of deliveries for the same key doesn't queue
/// redundant work behind the one already running.
async fn submit(state: &AppState, item: WorkItem) -> Result<StatusCode, StatusCode> {
    let queued = state.pool.queued_items();
    let running = state.pool.running_keys();
    for item in reconcile_queue(vec![item], &queued, &running) {
        state.pool.submit(item).await.map_err(|e| {
            warn!(error = %e, "worker pool rejected work item");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    }
    Ok(StatusCode::OK)
}

/// Verifies `X-Hub-Signature-256` the same way GitHub computes it:
/// `sha256=` followed by the hex-encoded HMAC-SHA256 of the raw body.
fn verify_signature(secret: &str, headers: &HeaderMap, body: &str) -> bool {
    let Some(signature) = headers.get("X-Hub-Signature-256").and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body.as_bytes());
    let computed = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

    signature == computed
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
