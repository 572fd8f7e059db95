//! PR state machine (C5): computes the declarative surface (state, labels,
//! prePush comment) a pull request should have, given its current content
//! and the facts the rest of the core has gathered about it.
//!
//! This module is pure — it never touches the forge. Callers apply the
//! returned [`Reconciliation`] via forge operations and are responsible
//! for re-running it whenever the PR's observable state changes.

use std::collections::BTreeSet;

use review_warden_forge::census::Role;
use review_warden_forge::models::{CheckConclusion, CheckStatus, PullRequest};

use crate::labels::{label_diff, labels_for_changed_files};
use crate::markers::PrePushMarker;

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;

/// Where a PR sits in its lifecycle (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Draft,
    NeedsReview,
    ReadyToIntegrate,
    ReadyToSponsor,
    Integrating,
    Integrated,
}

/// Everything the state machine needs to decide a PR's declarative
/// surface, gathered by the caller from the forge, census and jcheck
/// facade.
pub struct ReconciliationInput<'a> {
    pub pr: &'a PullRequest,
    pub jcheck: Option<&'a CheckStatus>,
    pub author_role: Option<Role>,
    pub required_reviewers: u8,
    pub approving_reviewers: u8,
    pub has_issue_link: bool,
    pub csr_required: bool,
    pub csr_satisfied: bool,
    pub changed_files: &'a [String],
    pub label_configuration: &'a crate::config::LabelConfiguration,
    /// The pre-push marker from the most recent bot comment, if the
    /// integration protocol already started (crash-recovery input).
    pub pre_push_marker: Option<&'a PrePushMarker>,
}

/// The result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub state: PrState,
    pub desired_labels: BTreeSet<String>,
    pub labels_to_add: Vec<String>,
    pub labels_to_remove: Vec<String>,
    pub pre_push_comment: Option<String>,
}

/// Runs one reconciliation pass. Idempotent: given the same input twice,
/// returns the same [`Reconciliation`] both times (§3's
/// declarative-convergence invariant).
pub fn reconcile(input: &ReconciliationInput) -> Reconciliation {
    let current_labels: BTreeSet<String> = input.pr.labels.iter().map(|l| l.name.clone()).collect();

    if input.pr.state == review_warden_forge::models::PullRequestState::Closed
        && current_labels.contains("integrated")
    {
        return converge(input, PrState::Integrated, current_labels, None);
    }

    if input.pr.draft {
        return converge(input, PrState::Draft, current_labels, None);
    }

    let jcheck_passed = matches!(
        input.jcheck,
        Some(CheckStatus { conclusion: CheckConclusion::Success, commit_hash, .. })
            if commit_hash == &input.pr.head_hash
    );
    let reviews_satisfied = input.approving_reviewers >= input.required_reviewers;
    let issues_satisfied = input.has_issue_link;
    let csr_satisfied = !input.csr_required || input.csr_satisfied;

    let all_preconditions_met = jcheck_passed && reviews_satisfied && issues_satisfied && csr_satisfied;

    if !all_preconditions_met {
        return converge(input, PrState::NeedsReview, current_labels, None);
    }

    if input.pre_push_marker.is_some() {
        return converge(input, PrState::Integrating, current_labels, None);
    }

    let is_committer = matches!(input.author_role, Some(role) if role >= Role::Committer);
    if is_committer {
        converge(
            input,
            PrState::ReadyToIntegrate,
            current_labels,
            Some(format!(
                "This change now passes all automated pre-integration checks. To integrate \
                it into `{}`, type `/integrate` in a new comment.",
                input.pr.target_branch
            )),
        )
    } else {
        converge(
            input,
            PrState::ReadyToSponsor,
            current_labels,
            Some(format!(
                "@{} this change is now ready to be sponsored at version `{}`. A committer may \
                issue `/sponsor` to integrate it.",
                input.pr.author.as_ref().map(|u| u.login.as_str()).unwrap_or("author"),
                input.pr.head_hash
            )),
        )
    }
}

fn converge(
    input: &ReconciliationInput,
    state: PrState,
    current_labels: BTreeSet<String>,
    pre_push_comment: Option<String>,
) -> Reconciliation {
    // State labels (`ready`, `rfr`, `sponsor`, `integrated`, `csr`) are
    // bot-managed: they're recomputed from scratch below and layered on
    // top of C9's file-pattern labels, rather than carried over from
    // `current_labels`.
    let mut desired_labels = labels_for_changed_files(input.label_configuration, input.changed_files);

    match state {
        PrState::ReadyToIntegrate => {
            desired_labels.insert("ready".to_string());
        }
        PrState::ReadyToSponsor => {
            desired_labels.insert("ready".to_string());
            desired_labels.insert("sponsor".to_string());
        }
        PrState::Integrated => {
            desired_labels.insert("integrated".to_string());
        }
        PrState::NeedsReview | PrState::Integrating => {
            desired_labels.insert("rfr".to_string());
        }
        PrState::Draft => {}
    }
    if input.csr_required && !input.csr_satisfied {
        desired_labels.insert("csr".to_string());
    }

    let (labels_to_add, labels_to_remove) = label_diff(&current_labels, &desired_labels);

    Reconciliation {
        state,
        desired_labels,
        labels_to_add,
        labels_to_remove,
        pre_push_comment,
    }
}
