//! Jcheck facade (C4): a narrow trait over the per-commit style/policy
//! validator. The validator itself (parsing `.jcheck/conf`, checking commit
//! message format, whitespace, author identity, etc.) is out of scope —
//! only its contract is specified here, same as the issue tracker and git
//! plumbing in `review_warden_forge`.

use async_trait::async_trait;

use review_warden_forge::models::CheckStatus;

use crate::errors::CoreError;

#[cfg(test)]
#[path = "jcheck_tests.rs"]
mod tests;

/// Runs policy validation against a proposed commit and reports the result
/// in the same shape the forge publishes as a status check.
#[async_trait]
pub trait JcheckFacade: Send + Sync {
    /// Validates `commit_hash` in `repo` against its `.jcheck/conf`.
    ///
    /// A `CoreError::Fatal` result means the revision carries no
    /// `.jcheck/conf` or an unparsable one; the caller must not retry until
    /// the repository's configuration changes.
    async fn validate(&self, repo: &str, commit_hash: &str) -> Result<CheckStatus, CoreError>;
}

/// A facade returning a fixed, pre-computed result, for tests and for
/// operators who run jcheck out-of-band and record its output statically.
pub struct StaticJcheckFacade {
    result: CheckStatus,
}

impl StaticJcheckFacade {
    /// Builds a facade that always returns `result`, regardless of which
    /// commit is asked about.
    pub fn new(result: CheckStatus) -> Self {
        Self { result }
    }
}

#[async_trait]
impl JcheckFacade for StaticJcheckFacade {
    async fn validate(&self, _repo: &str, _commit_hash: &str) -> Result<CheckStatus, CoreError> {
        Ok(self.result.clone())
    }
}
