//! Errors surfaced by the server binary's own plumbing (webhook intake,
//! telemetry bootstrap, secrets/config loading). Errors raised while
//! evaluating a pull request stay in [`review_warden_core::errors::CoreError`]
//! and are logged, not converted, since a single bad work item must never
//! bring the process down.

use thiserror::Error;

/// Errors raised outside the scope of a single work item.
#[derive(Error, Debug)]
pub enum ServerError {
    /// A required environment variable or secret was missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The process failed to authenticate with the forge as itself.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The webhook payload could not be parsed or its signature did not match.
    #[error("invalid webhook request: {0}")]
    InvalidWebhook(String),

    /// The telemetry subscriber could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}
