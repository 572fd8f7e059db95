use super::*;
use std::error::Error as StdError;

#[test]
fn test_api_error() {
    let error = Error::ApiError("boom".to_string());

    assert_eq!(error.to_string(), "API request failed: boom");
    assert!(error.source().is_none());
}

#[test]
fn test_auth_error() {
    let error = Error::AuthError("Invalid credentials".to_string());

    assert_eq!(
        error.to_string(),
        "Authentication failed: Invalid credentials"
    );
}

#[test]
fn test_failed_to_update_pull_request_error() {
    let error = Error::FailedToUpdatePullRequest("Network error".to_string());

    assert_eq!(
        error.to_string(),
        "Failed to update the pull request: Network error"
    );
}

#[test]
fn test_push_rejected_error() {
    let error = Error::PushRejected("main".to_string(), "deadbeef".to_string());

    assert_eq!(error.to_string(), "Push to main rejected, target is at deadbeef");
    assert_eq!(error.retry_hint(), RetryHint::None);
}

#[test]
fn test_invalid_response_error() {
    let error = Error::InvalidResponse("not json".to_string());

    assert_eq!(error.to_string(), "Invalid response format: not json");
}

#[test]
fn test_rate_limit_exceeded_error_carries_retry_hint() {
    let error = Error::RateLimitExceeded(Duration::from_secs(30));

    assert!(matches!(error.retry_hint(), RetryHint::After(d) if d == Duration::from_secs(30)));
}

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("pull request 42".to_string());

    assert_eq!(error.to_string(), "Entity not found: pull request 42");
    assert_eq!(error.retry_hint(), RetryHint::None);
}

#[test]
fn test_invalid_config_error() {
    let error = Error::InvalidConfig("missing field censusRepo".to_string());

    assert_eq!(
        error.to_string(),
        "Configuration could not be parsed: missing field censusRepo"
    );
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
