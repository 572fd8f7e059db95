//! Integration/sponsor protocol (C7): the atomic push-and-finalize
//! sequence from §4.4, plus the crash-recovery decision it needs on
//! every re-entry.

use review_warden_forge::git::{CommitSpec, GitPlumbing, MergeOutcome};
use review_warden_forge::models::{PullRequest, PushOutcome};
use review_warden_forge::ForgeClient;

use crate::errors::CoreError;
use crate::markers::PrePushMarker;

#[cfg(test)]
#[path = "integration_tests.rs"]
mod tests;

/// How to proceed given the PR's pre-push marker state and the target
/// branch's current contents, per §4.4's crash-recovery rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// No marker, or the marker's target head has been superseded and its
    /// commit is absent from history: safe to build a fresh candidate.
    Restart,
    /// The marker's candidate digest is already present on the target:
    /// the push landed, only the finalizer (comment + labels + close)
    /// still needs to run.
    Finalize,
    /// The marker is for the current attempt and still consistent:
    /// reuse it rather than composing a new pre-push comment.
    ReusePrePush,
}

/// Decides the recovery action for a PR found with an existing marker.
///
/// `target_head` is the target branch's current head; `digest_on_target`
/// is `true` if walking back from `target_head` found a commit matching
/// the marker's message digest.
pub fn decide_recovery(marker: &PrePushMarker, target_head: &str, digest_on_target: bool) -> RecoveryAction {
    if digest_on_target {
        return RecoveryAction::Finalize;
    }
    if marker.target_head == target_head {
        RecoveryAction::ReusePrePush
    } else {
        RecoveryAction::Restart
    }
}

/// Renders the "Going to push as commit ..." comment body, with the
/// hidden marker embedded.
pub fn render_pre_push_comment(marker: &PrePushMarker) -> String {
    format!(
        "Going to push as commit `{}`.\n\n{}",
        marker.candidate_hash,
        marker.encode()
    )
}

/// Renders the "Pushed as commit ..." comment body.
pub fn render_pushed_comment(hash: &str) -> String {
    format!("Pushed as commit `{hash}`.")
}

/// Builds the candidate commit: materializes the target, rebases the PR
/// onto it, and commits with the composed message. Returns `None` on
/// conflict (§4.4 step 2's abort path).
pub async fn build_candidate(
    git: &dyn GitPlumbing,
    repo: &str,
    pr: &PullRequest,
    spec: CommitSpec,
) -> Result<Option<(String, String)>, CoreError> {
    let target_tree = git
        .materialize(repo, &pr.target_branch)
        .await
        .map_err(CoreError::from)?;
    let target_head = target_tree.head.clone();

    let source_tree = git.materialize(repo, &pr.head_hash).await.map_err(CoreError::from)?;
    match git.rebase(&source_tree, &target_head).await.map_err(CoreError::from)? {
        MergeOutcome::Conflict => {
            git.discard(source_tree).await;
            git.discard(target_tree).await;
            Ok(None)
        }
        MergeOutcome::Clean(_) => {
            let candidate_hash = git.commit(&source_tree, spec).await.map_err(CoreError::from)?;
            git.discard(source_tree).await;
            git.discard(target_tree).await;
            Ok(Some((candidate_hash, target_head)))
        }
    }
}

/// Runs §4.4's atomic push-and-finalize sequence, assuming the candidate
/// has already been built and a pre-push comment posted.
///
/// Crash-safety is the caller's responsibility: this function performs
/// the compare-and-set push and, on success, the finalizer. A caller
/// re-entering after a crash should consult [`decide_recovery`] instead
/// of calling this again blindly.
async fn push_once(forge: &dyn ForgeClient, repo: &str, marker: &PrePushMarker) -> Result<PushOutcome, CoreError> {
    let outcome = forge
        .compare_and_set_push(
            repo,
            &marker.target_branch,
            &marker.target_head,
            &marker.candidate_hash,
        )
        .await
        .map_err(CoreError::from)?;

    if let PushOutcome::Accepted { .. } = &outcome {
        forge
            .add_comment(repo, marker.pull_request_id, &render_pushed_comment(&marker.candidate_hash))
            .await
            .map_err(CoreError::from)?;
        forge
            .add_labels(repo, marker.pull_request_id, &["integrated".to_string()])
            .await
            .map_err(CoreError::from)?;
        for label in ["ready", "rfr", "sponsor"] {
            forge.remove_label(repo, marker.pull_request_id, label).await.map_err(CoreError::from)?;
        }
        forge
            .close_pull_request(repo, marker.pull_request_id)
            .await
            .map_err(CoreError::from)?;
    }

    Ok(outcome)
}

/// Bound on rebase-and-retry attempts when the target branch moves
/// between building the candidate and pushing it, so a busy target branch
/// can't wedge an integration attempt into an infinite loop.
const MAX_PUSH_ATTEMPTS: u32 = 3;

/// Pushes the candidate described by `marker`, retrying from a fresh
/// rebase up to [`MAX_PUSH_ATTEMPTS`] times when the compare-and-set push
/// is rejected because the target branch moved in the meantime (§4.4's
/// "Push rejected (target moved) → retry from rebase").
///
/// On the final rejection, or when a retried rebase conflicts, posts an
/// explanatory comment and returns the last `PushOutcome::Rejected` rather
/// than looping forever.
pub async fn push_and_finalize(
    forge: &dyn ForgeClient,
    git: &dyn GitPlumbing,
    repo: &str,
    pr: &PullRequest,
    spec_template: &CommitSpec,
    mut marker: PrePushMarker,
) -> Result<PushOutcome, CoreError> {
    for attempt in 1..=MAX_PUSH_ATTEMPTS {
        let outcome = push_once(forge, repo, &marker).await?;
        let actual_head = match outcome {
            PushOutcome::Accepted { .. } => return Ok(outcome),
            PushOutcome::Rejected { actual_head } => actual_head,
        };

        if attempt == MAX_PUSH_ATTEMPTS {
            forge
                .add_comment(
                    repo,
                    marker.pull_request_id,
                    "The target branch keeps moving; giving up after repeated rebase attempts.",
                )
                .await
                .map_err(CoreError::from)?;
            return Ok(PushOutcome::Rejected { actual_head });
        }

        let spec = spec_template.clone();
        match build_candidate(git, repo, pr, spec).await? {
            Some((candidate_hash, target_head)) => {
                marker = PrePushMarker {
                    pull_request_id: marker.pull_request_id,
                    target_branch: marker.target_branch,
                    target_head,
                    candidate_hash,
                    message_digest: marker.message_digest,
                };
                forge
                    .add_comment(repo, marker.pull_request_id, &render_pre_push_comment(&marker))
                    .await
                    .map_err(CoreError::from)?;
            }
            None => {
                forge
                    .add_comment(
                        repo,
                        marker.pull_request_id,
                        "This pull request can not be integrated; please merge the target branch.",
                    )
                    .await
                    .map_err(CoreError::from)?;
                return Ok(PushOutcome::Rejected { actual_head });
            }
        }
    }

    unreachable!("loop always returns by the final attempt")
}
