use super::*;
use serde_json::{from_str, to_string};

#[test]
fn test_comment_round_trip() {
    let comment = Comment {
        id: 123,
        user: User { id: 1, login: "a".to_string() },
        body: "This is a test comment".to_string(),
    };

    let json_str = to_string(&comment).expect("serialize Comment");
    let parsed: Comment = from_str(&json_str).expect("deserialize Comment");

    assert_eq!(parsed, comment);
}

#[test]
fn test_label_round_trip() {
    let label = Label { name: "bug".to_string() };

    let json_str = to_string(&label).expect("serialize Label");
    let parsed: Label = from_str(&json_str).expect("deserialize Label");

    assert_eq!(parsed, label);
}

#[test]
fn test_pull_request_round_trip() {
    let pr = PullRequest {
        number: 42,
        title: "feat: add new feature".to_string(),
        body: Some("This PR adds a new feature.\n\nFixes #123".to_string()),
        draft: false,
        state: PullRequestState::Open,
        source_branch: "feature".to_string(),
        target_branch: "main".to_string(),
        head_hash: "abc123".to_string(),
        author: None,
        labels: vec![Label { name: "ready".to_string() }],
        reviews: vec![],
        comments: vec![],
    };

    let json_str = to_string(&pr).expect("serialize PullRequest");
    let parsed: PullRequest = from_str(&json_str).expect("deserialize PullRequest");

    assert_eq!(parsed, pr);
    assert!(parsed.has_label("ready"));
    assert!(!parsed.has_label("sponsor"));
}

#[test]
fn test_pull_request_without_body() {
    let pr = PullRequest {
        number: 42,
        title: "feat: add new feature".to_string(),
        body: None,
        draft: true,
        state: PullRequestState::Open,
        source_branch: "feature".to_string(),
        target_branch: "main".to_string(),
        head_hash: "abc123".to_string(),
        author: None,
        labels: vec![],
        reviews: vec![],
        comments: vec![],
    };

    let json_str = to_string(&pr).expect("serialize PullRequest");
    let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse json");
    assert!(parsed["body"].is_null());

    let deserialized_pr: PullRequest = from_str(&json_str).expect("deserialize PullRequest");
    assert_eq!(deserialized_pr.body, None);
}

#[test]
fn test_review_round_trip() {
    let review = Review {
        id: 789,
        user: User { id: 101, login: "testuser".to_string() },
        state: ReviewState::ChangesRequested,
        commit_hash: "deadbeef".to_string(),
        body: None,
    };

    let json_str = to_string(&review).expect("serialize Review");
    let parsed: Review = from_str(&json_str).expect("deserialize Review");

    assert_eq!(parsed, review);
}

#[test]
fn test_review_state_serializes_snake_case() {
    let json_str = to_string(&ReviewState::ChangesRequested).expect("serialize ReviewState");
    assert_eq!(json_str, "\"changes_requested\"");
}

#[test]
fn test_user_round_trip() {
    let user = User { id: 303, login: "developer".to_string() };

    let json_str = to_string(&user).expect("serialize User");
    let parsed: User = from_str(&json_str).expect("deserialize User");

    assert_eq!(parsed, user);
}

#[test]
fn test_check_status_round_trip() {
    let status = CheckStatus {
        conclusion: CheckConclusion::Success,
        commit_hash: "abc123".to_string(),
        summary: "all checks passed".to_string(),
        details: "".to_string(),
    };

    let json_str = to_string(&status).expect("serialize CheckStatus");
    let parsed: CheckStatus = from_str(&json_str).expect("deserialize CheckStatus");

    assert_eq!(parsed, status);
}

#[test]
fn test_push_outcome_is_not_serialized_but_comparable() {
    let accepted = PushOutcome::Accepted { new_head: "abc".to_string() };
    let rejected = PushOutcome::Rejected { actual_head: "def".to_string() };

    assert_ne!(accepted, rejected);
}
