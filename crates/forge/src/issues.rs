//! Issue tracker client: lookup, linkage and creation of issue-tracker
//! entries referenced from pull request bodies and `/issue` commands.
//!
//! Trait-only, per the specification: no production adapter ships in this
//! workspace, only the contract other crates code against and the test
//! doubles integration tests supply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// The resolution state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Still open.
    Unresolved,
    /// Closed as fixed.
    Fixed,
    /// Closed as a duplicate, won't-fix, or similar non-fix disposition.
    Other,
}

/// An issue-tracker entry, as the bot needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Canonical id, e.g. `PROJ-123`.
    pub id: String,
    /// Short human title.
    pub summary: String,
    /// The issue type, e.g. `Bug`, `Enhancement`, `CSR`.
    pub issue_type: String,
    /// Current resolution.
    pub resolution: Resolution,
    /// Fix versions recorded on the issue.
    pub fix_versions: Vec<String>,
    /// Ids of issues linked as "csr for" this one.
    pub csr_for: Vec<String>,
    /// Ids of issues linked as "backported by" this one.
    pub backported_by: Vec<String>,
}

/// Properties supplied when creating a new issue, e.g. for `/backport` or
/// `/issue create`.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    /// Short human title.
    pub summary: String,
    /// Components to file the issue under.
    pub components: Vec<String>,
    /// The issue type.
    pub issue_type: String,
    /// Priority, tracker-specific.
    pub priority: Option<String>,
}

/// Client for the issue tracker a project links PRs against.
#[async_trait]
pub trait IssueTrackerClient: Send + Sync {
    /// Looks up an issue, tolerant of `PROJ-123`, bare `123`, and case
    /// variants of the project key.
    async fn lookup(&self, id: &str) -> Result<Option<Issue>, Error>;

    /// Creates a new issue and returns its assigned id.
    async fn create(&self, project: &str, issue: NewIssue) -> Result<String, Error>;
}
