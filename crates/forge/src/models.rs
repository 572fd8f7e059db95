//! # Forge data model
//!
//! Plain data types shared between [`crate::ForgeClient`] implementations and
//! `review_warden_core`. A pull request is owned by the forge; the core only
//! ever mutates it through forge operations, so these types carry no
//! behavior of their own beyond simple accessors.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// A forge user account.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct User {
    /// Stable numeric id assigned by the forge.
    pub id: u64,

    /// Login handle, used to resolve census roles and to address users in replies.
    pub login: String,
}

/// Open/closed lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    /// The PR is open and may still receive commands and commits.
    Open,

    /// The PR has been closed, with or without integration.
    Closed,
}

/// The disposition of a [`Review`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// An approving review.
    Approved,

    /// A review requesting changes.
    ChangesRequested,

    /// A non-blocking, comment-only review.
    Commented,

    /// A review that has been dismissed and no longer counts.
    Dismissed,
}

/// A review left on a pull request.
///
/// # Examples
///
/// ```
/// use review_warden_forge::models::{Review, ReviewState, User};
///
/// let review = Review {
///     id: 1,
///     user: User { id: 10, login: "alice".to_string() },
///     state: ReviewState::Approved,
///     commit_hash: "abc123".to_string(),
///     body: None,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Forge-assigned review id.
    pub id: u64,

    /// The reviewer.
    pub user: User,

    /// The disposition of the review.
    pub state: ReviewState,

    /// The head hash of the PR at the time the review was given.
    ///
    /// Used to decide whether the review is still valid when
    /// `useStaleReviews` is false.
    pub commit_hash: String,

    /// Free-text review body, if any.
    pub body: Option<String>,
}

/// A comment on a pull request.
///
/// # Examples
///
/// ```
/// use review_warden_forge::models::{Comment, User};
///
/// let comment = Comment {
///     id: 456,
///     user: User { id: 10, login: "a".to_string() },
///     body: "Please update your PR title.".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Forge-assigned comment id, needed to edit or delete it later.
    pub id: u64,

    /// The author of the comment.
    pub user: User,

    /// The rendered markdown body, including any hidden marker comments.
    pub body: String,
}

/// A comment attached to a commit rather than a pull request.
///
/// Commit comments carry commands for merged-commit workflows such as
/// `/backport`, `/tag` and `/branch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitComment {
    /// Forge-assigned comment id.
    pub id: u64,

    /// The author of the comment.
    pub user: User,

    /// The comment body.
    pub body: String,
}

/// A label applied to, or available on, a repository/pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// The label's display name, e.g. `ready` or `rfr`.
    pub name: String,
}

/// A file changed by a pull request, used for size analysis and C9 labeling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFile {
    /// Repository-relative path of the changed file.
    pub filename: String,

    /// Lines added.
    pub additions: u64,

    /// Lines removed.
    pub deletions: u64,
}

/// A pull request as observed from the forge.
///
/// # Examples
///
/// ```
/// use review_warden_forge::models::{PullRequest, PullRequestState, User};
///
/// let pr = PullRequest {
///     number: 123,
///     title: "feat(auth): add GitHub login".to_string(),
///     body: Some("Fixes #42".to_string()),
///     draft: false,
///     state: PullRequestState::Open,
///     source_branch: "feature/login".to_string(),
///     target_branch: "main".to_string(),
///     head_hash: "deadbeef".to_string(),
///     author: Some(User { id: 456, login: "developer123".to_string() }),
///     labels: vec![],
///     reviews: vec![],
///     comments: vec![],
/// };
/// assert!(!pr.has_label("ready"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// The pull request number, unique within the repository.
    pub number: u64,

    /// The current title.
    pub title: String,

    /// The current body/description, if any.
    pub body: Option<String>,

    /// Whether the PR is still marked as a draft.
    pub draft: bool,

    /// Open or closed.
    pub state: PullRequestState,

    /// The branch the change is proposed from.
    pub source_branch: String,

    /// The branch the change would land on.
    pub target_branch: String,

    /// The current head commit hash of the source branch.
    pub head_hash: String,

    /// The author of the pull request, if resolvable.
    pub author: Option<User>,

    /// Labels currently applied, in no particular order.
    pub labels: Vec<Label>,

    /// Reviews, oldest first.
    pub reviews: Vec<Review>,

    /// Comments, oldest first.
    pub comments: Vec<Comment>,
}

impl PullRequest {
    /// Returns `true` if `label` is currently applied to the pull request.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.name == label)
    }
}

/// A commit as observed on the target branch or a referenced ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit hash.
    pub hash: String,

    /// The full commit message.
    pub message: String,

    /// The recorded author identity.
    pub author: User,

    /// The recorded committer identity.
    pub committer: User,

    /// Parent hashes, in order.
    pub parents: Vec<String>,

    /// Comments attached to this commit, oldest first.
    pub commit_comments: Vec<CommitComment>,
}

/// The conclusion of a jcheck run, published as a forge status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// Validation succeeded; the PR may become ready.
    Success,

    /// Validation failed; the PR can never be ready at this head.
    Failure,

    /// Validation is still running.
    InProgress,
}

/// The result of running jcheck against a proposed commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatus {
    /// Pass/fail/in-progress.
    pub conclusion: CheckConclusion,

    /// The head hash this result was computed against; becomes stale once
    /// the PR's head hash changes.
    pub commit_hash: String,

    /// One-line human summary shown in the forge's checks UI.
    pub summary: String,

    /// Longer free-text detail, rendered below the summary.
    pub details: String,
}

/// Outcome of a compare-and-set push to a named branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The push landed; the branch now points at the given hash.
    Accepted {
        /// The new head hash of the target branch.
        new_head: String,
    },

    /// The push was rejected because the target branch moved since it was read.
    Rejected {
        /// The target branch's head at the time of rejection.
        actual_head: String,
    },
}

/// A repository installation the bot operates against.
#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    /// Forge-assigned installation id.
    pub id: u64,

    /// The app slug, if set.
    pub slug: Option<String>,
}

/// A repository the bot has access to.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// `owner/name`.
    pub full_name: String,

    /// Bare repository name.
    pub name: String,

    /// Whether the repository is private.
    pub private: bool,
}
