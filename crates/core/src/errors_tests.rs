use super::*;
use std::time::Duration;

#[test]
fn user_input_errors_are_never_retried() {
    let error = CoreError::UserInput("unknown command /frobnicate".to_string());

    assert_eq!(error.retry_hint(), RetryHint::None);
    assert!(error.is_user_facing());
}

#[test]
fn transient_errors_carry_their_retry_hint() {
    let error = CoreError::Transient("github 503".to_string(), RetryHint::After(Duration::from_secs(5)));

    assert!(matches!(error.retry_hint(), RetryHint::After(d) if d == Duration::from_secs(5)));
    assert!(!error.is_user_facing());
}

#[test]
fn semantic_failures_are_user_facing() {
    let error = CoreError::Semantic("merge conflict against target".to_string());

    assert!(error.is_user_facing());
    assert_eq!(error.retry_hint(), RetryHint::None);
}

#[test]
fn forge_errors_delegate_retry_hint() {
    let error: CoreError = review_warden_forge::errors::Error::RateLimitExceeded(Duration::from_secs(30)).into();

    assert!(matches!(error.retry_hint(), RetryHint::After(d) if d == Duration::from_secs(30)));
    assert!(!error.is_user_facing());
}
