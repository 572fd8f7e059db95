//! Errors raised by the policy engine, tagged with how the caller should
//! respond per the three-category taxonomy.

pub use review_warden_forge::errors::RetryHint;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while evaluating or acting on a pull request or commit.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A command invocation was malformed or used by someone without the
    /// required role. Surfaced as a single PR reply; state unchanged.
    #[error("user input error: {0}")]
    UserInput(String),

    /// A forge/issue-tracker/git call failed in a way expected to clear up
    /// on its own (5xx, timeout, rate limit).
    #[error("transient external error: {0}")]
    Transient(String, RetryHint),

    /// The requested state cannot be reached given the PR's current
    /// content (merge conflict, jcheck failure, missing issue link).
    #[error("semantic failure: {0}")]
    Semantic(String),

    /// A previous run was interrupted mid-protocol and left markers that
    /// don't match the PR's current observable state.
    #[error("inconsistent recoverable state: {0}")]
    Inconsistent(String),

    /// The bot cannot proceed until an operator fixes configuration or
    /// repository metadata; do not retry until that happens.
    #[error("fatal configuration error: {0}")]
    Fatal(String),

    /// Propagated from the forge/issue-tracker/git-plumbing boundary.
    #[error(transparent)]
    Forge(#[from] review_warden_forge::errors::Error),
}

impl CoreError {
    /// How the caller should respond to this error, per §7's taxonomy.
    pub fn retry_hint(&self) -> RetryHint {
        match self {
            CoreError::UserInput(_)
            | CoreError::Semantic(_)
            | CoreError::Inconsistent(_)
            | CoreError::Fatal(_) => RetryHint::None,
            CoreError::Transient(_, hint) => *hint,
            CoreError::Forge(e) => e.retry_hint(),
        }
    }

    /// `true` for errors the state machine should surface as a PR reply
    /// rather than retry.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CoreError::UserInput(_) | CoreError::Semantic(_) | CoreError::Fatal(_)
        )
    }
}
