//! Errors surfaced by [`crate::ForgeClient`] and its sibling traits.

use std::time::Duration;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// How the caller should respond to an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// The error is not transient; retrying will not help.
    None,
    /// Retry after roughly this long.
    After(Duration),
    /// The caller has already exhausted its retry budget for this operation.
    Exhausted,
}

/// Errors returned by forge, issue-tracker, git-plumbing and census adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Failed to create an app access token for repository: {0}/{1}. For app with ID: {2}")]
    FailedToCreateAccessToken(String, String, u64),

    #[error("Failed to find installation for repository: {0}/{1} with ID: {2}")]
    FailedToFindAppInstallation(String, String, u64),

    #[error("Failed to update the pull request: {0}")]
    FailedToUpdatePullRequest(String),

    #[error("Push to {0} rejected, target is at {1}")]
    PushRejected(String, String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded, retry after {0:?}")]
    RateLimitExceeded(Duration),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Configuration could not be parsed: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Classifies the error per the taxonomy used by `review_warden_core`.
    pub fn retry_hint(&self) -> RetryHint {
        match self {
            Error::RateLimitExceeded(d) => RetryHint::After(*d),
            Error::ApiError(_) => RetryHint::After(Duration::from_secs(5)),
            Error::PushRejected(_, _) => RetryHint::None,
            Error::AuthError(_)
            | Error::FailedToCreateAccessToken(_, _, _)
            | Error::FailedToFindAppInstallation(_, _, _)
            | Error::FailedToUpdatePullRequest(_)
            | Error::InvalidResponse(_)
            | Error::NotFound(_)
            | Error::InvalidConfig(_) => RetryHint::None,
        }
    }
}
