//! Git plumbing: clone, fetch, branch, merge, rebase, commit and push
//! against a local materialization of a repository.
//!
//! Trait-only, per the specification: no production adapter ships in this
//! workspace. A real implementation would shell out to `git2` or the `git`
//! binary against the seed-storage working trees described in the
//! concurrency model.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::errors::Error;
use crate::models::User;

/// A private working tree checked out from the seed storage cache.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    /// Filesystem location of the checkout.
    pub path: PathBuf,
    /// The hash currently checked out.
    pub head: String,
}

/// The author/committer identities and message to use for a new commit.
#[derive(Debug, Clone)]
pub struct CommitSpec {
    /// Full commit message, including trailers.
    pub message: String,
    /// Recorded author identity.
    pub author: User,
    /// Recorded committer identity.
    pub committer: User,
}

/// Outcome of attempting to rebase or merge one ref onto another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The operation succeeded; the tree now sits at this hash.
    Clean(String),
    /// The operation could not be completed without manual resolution.
    Conflict,
}

/// Git plumbing operations against a local materialization cache.
#[async_trait]
pub trait GitPlumbing: Send + Sync {
    /// Ensures a bare clone of `repo` exists in seed storage and is
    /// up to date, then checks out a private working tree at `rev`.
    async fn materialize(&self, repo: &str, rev: &str) -> Result<WorkingTree, Error>;

    /// Fetches `rev` into an existing working tree's backing clone.
    async fn fetch(&self, tree: &WorkingTree, rev: &str) -> Result<(), Error>;

    /// Rebases the commits unique to `tree.head` onto `onto`.
    async fn rebase(&self, tree: &WorkingTree, onto: &str) -> Result<MergeOutcome, Error>;

    /// Creates a commit in `tree` with the given working-tree contents.
    async fn commit(&self, tree: &WorkingTree, spec: CommitSpec) -> Result<String, Error>;

    /// Creates a branch named `name` pointing at `hash` in `repo`.
    async fn create_branch(&self, repo: &str, name: &str, hash: &str) -> Result<(), Error>;

    /// Walks back up to `limit` commits from `hash` looking for one whose
    /// message contains `needle`, returning its hash if found.
    async fn find_ancestor_with_message(
        &self,
        repo: &str,
        hash: &str,
        needle: &str,
        limit: usize,
    ) -> Result<Option<String>, Error>;

    /// Deletes `tree`'s checkout. Best-effort and idempotent.
    async fn discard(&self, tree: WorkingTree);
}

/// A placeholder that fails every operation, for binaries that wire up a
/// [`GitPlumbing`] slot but have not configured a real adapter. Read-only
/// reconciliation, labeling, and status reporting keep working; `/integrate`
/// and `/sponsor` surface a fatal configuration error until a real adapter
/// is plugged in.
pub struct NullGitPlumbing;

#[async_trait]
impl GitPlumbing for NullGitPlumbing {
    async fn materialize(&self, _repo: &str, _rev: &str) -> Result<WorkingTree, Error> {
        Err(Error::InvalidConfig("no git plumbing adapter configured".to_string()))
    }

    async fn fetch(&self, _tree: &WorkingTree, _rev: &str) -> Result<(), Error> {
        Err(Error::InvalidConfig("no git plumbing adapter configured".to_string()))
    }

    async fn rebase(&self, _tree: &WorkingTree, _onto: &str) -> Result<MergeOutcome, Error> {
        Err(Error::InvalidConfig("no git plumbing adapter configured".to_string()))
    }

    async fn commit(&self, _tree: &WorkingTree, _spec: CommitSpec) -> Result<String, Error> {
        Err(Error::InvalidConfig("no git plumbing adapter configured".to_string()))
    }

    async fn create_branch(&self, _repo: &str, _name: &str, _hash: &str) -> Result<(), Error> {
        Err(Error::InvalidConfig("no git plumbing adapter configured".to_string()))
    }

    async fn find_ancestor_with_message(
        &self,
        _repo: &str,
        _hash: &str,
        _needle: &str,
        _limit: usize,
    ) -> Result<Option<String>, Error> {
        Err(Error::InvalidConfig("no git plumbing adapter configured".to_string()))
    }

    async fn discard(&self, _tree: WorkingTree) {}
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
