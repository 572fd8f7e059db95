//! # `review_warden_forge`
//!
//! Narrow client traits for the hosted forge, the issue tracker, git
//! plumbing and the census/ACL repository, plus a GitHub-backed
//! implementation of the forge trait.
//!
//! `review_warden_core` depends only on the traits in this crate, never on
//! `github` directly, so the bot's policy logic can be exercised against a
//! mock forge in tests and, in principle, ported to another hosted forge by
//! implementing [`ForgeClient`] once.

use async_trait::async_trait;

pub mod auth;
pub mod census;
pub mod errors;
pub mod git;
pub mod github;
pub mod issues;
pub mod models;

use errors::Error;
use models::{
    CheckStatus, Comment, Commit, CommitComment, Label, PullRequest, PushOutcome, Review,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Client for the hosted source forge a repository lives on.
///
/// All operations are retriable; an implementation must not have applied a
/// mutation if it returns an [`Error`] (save for the compare-and-set push,
/// whose rejection is reported as `Ok(PushOutcome::Rejected { .. })` rather
/// than as an error, since a rejected push is an expected outcome, not a
/// failure).
#[async_trait]
pub trait ForgeClient: Send + Sync {
    /// Lists pull requests in `repo` updated since `since`, newest last.
    async fn list_updated_pull_requests(
        &self,
        repo: &str,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<PullRequest>, Error>;

    /// Fetches a single pull request by number.
    async fn get_pull_request(&self, repo: &str, number: u64) -> Result<PullRequest, Error>;

    /// Lists commit comments posted on `repo` since `since`.
    async fn list_new_commit_comments(
        &self,
        repo: &str,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<(Commit, CommitComment)>, Error>;

    /// Fetches a single commit, including its commit comments.
    async fn get_commit(&self, repo: &str, hash: &str) -> Result<Commit, Error>;

    /// Posts a new comment to a pull request and returns it.
    async fn add_comment(&self, repo: &str, pr: u64, body: &str) -> Result<Comment, Error>;

    /// Replaces the body of an existing pull request comment.
    async fn update_comment(&self, repo: &str, comment_id: u64, body: &str) -> Result<(), Error>;

    /// Deletes a pull request comment.
    async fn delete_comment(&self, repo: &str, comment_id: u64) -> Result<(), Error>;

    /// Lists comments on a pull request, oldest first.
    async fn list_comments(&self, repo: &str, pr: u64) -> Result<Vec<Comment>, Error>;

    /// Posts a new commit comment and returns it.
    async fn add_commit_comment(
        &self,
        repo: &str,
        hash: &str,
        body: &str,
    ) -> Result<CommitComment, Error>;

    /// Adds labels to a pull request. Labels already present are left alone.
    async fn add_labels(&self, repo: &str, pr: u64, labels: &[String]) -> Result<(), Error>;

    /// Removes a single label from a pull request, if present.
    async fn remove_label(&self, repo: &str, pr: u64, label: &str) -> Result<(), Error>;

    /// Lists labels currently applied to a pull request.
    async fn list_labels(&self, repo: &str, pr: u64) -> Result<Vec<Label>, Error>;

    /// Lists reviews on a pull request, oldest first.
    async fn list_reviews(&self, repo: &str, pr: u64) -> Result<Vec<Review>, Error>;

    /// Replaces the title of a pull request.
    async fn update_title(&self, repo: &str, pr: u64, title: &str) -> Result<(), Error>;

    /// Replaces the body of a pull request.
    async fn update_body(&self, repo: &str, pr: u64, body: &str) -> Result<(), Error>;

    /// Closes a pull request.
    async fn close_pull_request(&self, repo: &str, pr: u64) -> Result<(), Error>;

    /// Publishes or replaces the named status check result for `commit_hash`.
    async fn update_check_status(
        &self,
        repo: &str,
        commit_hash: &str,
        check_name: &str,
        status: &CheckStatus,
    ) -> Result<(), Error>;

    /// Pushes `new_head` onto `branch`, failing atomically if the branch is
    /// not currently at `expected_head`.
    async fn compare_and_set_push(
        &self,
        repo: &str,
        branch: &str,
        expected_head: &str,
        new_head: &str,
    ) -> Result<PushOutcome, Error>;

    /// Reads the raw bytes of `path` at `repo`'s default branch, if present.
    async fn read_repo_file(&self, repo: &str, path: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Lists the repository-relative paths of files changed by a pull
    /// request, for C9's file-pattern labeling.
    async fn list_changed_files(&self, repo: &str, pr: u64) -> Result<Vec<String>, Error>;
}

/// Fetches and parses the per-repository bot configuration.
///
/// Mirrors the way `merge_warden_core::config::ConfigFetcher` lets the core
/// ask for `.github/merge-warden.toml` without depending on the concrete
/// forge adapter; here the file is `.forge-bot/config.toml`.
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    /// Returns the raw TOML bytes of the bot config for `repo`, or `None` if
    /// the repository carries no config file and application defaults
    /// should be used.
    async fn fetch_config(&self, repo: &str) -> Result<Option<Vec<u8>>, Error>;
}

#[async_trait]
impl<T: ForgeClient> ConfigFetcher for T {
    async fn fetch_config(&self, repo: &str) -> Result<Option<Vec<u8>>, Error> {
        self.read_repo_file(repo, ".forge-bot/config.toml").await
    }
}
