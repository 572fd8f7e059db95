use super::*;

fn marker() -> PrePushMarker {
    PrePushMarker {
        pull_request_id: 7,
        target_branch: "master".to_string(),
        target_head: "target-head-1".to_string(),
        candidate_hash: "candidate-1".to_string(),
        message_digest: "digest-1".to_string(),
    }
}

#[test]
fn digest_present_on_target_means_finalize() {
    let action = decide_recovery(&marker(), "target-head-2", true);

    assert_eq!(action, RecoveryAction::Finalize);
}

#[test]
fn unchanged_target_head_means_reuse_pre_push() {
    let action = decide_recovery(&marker(), "target-head-1", false);

    assert_eq!(action, RecoveryAction::ReusePrePush);
}

#[test]
fn advanced_target_without_the_digest_means_restart() {
    let action = decide_recovery(&marker(), "target-head-2", false);

    assert_eq!(action, RecoveryAction::Restart);
}

#[test]
fn pre_push_comment_embeds_the_marker() {
    let m = marker();

    let comment = render_pre_push_comment(&m);

    assert!(comment.contains("candidate-1"));
    assert!(comment.contains("review-warden:pre-push"));
}

#[test]
fn pushed_comment_names_the_final_hash() {
    let comment = render_pushed_comment("abc123");

    assert_eq!(comment, "Pushed as commit `abc123`.");
}
