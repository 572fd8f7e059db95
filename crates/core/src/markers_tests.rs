use super::*;

#[test]
fn invocation_marker_round_trips() {
    let encoded = encode_invocation_marker("abc-123");

    assert_eq!(extract_invocation_id(&encoded).as_deref(), Some("abc-123"));
}

#[test]
fn extract_invocation_id_is_none_for_unrelated_text() {
    assert_eq!(extract_invocation_id("just a regular comment"), None);
}

#[test]
fn already_handled_finds_matching_marker_among_replies() {
    let replies = vec![
        "unrelated".to_string(),
        encode_invocation_marker("inv-1"),
        encode_invocation_marker("inv-2"),
    ];

    assert!(already_handled("inv-2", &replies));
    assert!(!already_handled("inv-3", &replies));
}

#[test]
fn self_command_marker_is_detected() {
    let body = format!("/integrate\n{SELF_COMMAND_MARKER}");

    assert!(has_self_command_marker(&body));
    assert!(!has_self_command_marker("/integrate"));
}

#[test]
fn pre_push_marker_round_trips_through_comment_text() {
    let marker = PrePushMarker {
        pull_request_id: 42,
        target_branch: "master".to_string(),
        target_head: "deadbeef".to_string(),
        candidate_hash: "cafebabe".to_string(),
        message_digest: "9f8e7d".to_string(),
    };

    let comment = format!("Going to push as commit cafebabe...\n\n{}", marker.encode());
    let decoded = PrePushMarker::decode(&comment).expect("marker decodes");

    assert_eq!(decoded, marker);
}

#[test]
fn pre_push_marker_decode_returns_none_without_marker() {
    assert_eq!(PrePushMarker::decode("Pushed as commit cafebabe."), None);
}

#[test]
fn latest_pre_push_marker_picks_the_most_recent_one() {
    let first = PrePushMarker {
        pull_request_id: 1,
        target_branch: "master".to_string(),
        target_head: "aaa".to_string(),
        candidate_hash: "bbb".to_string(),
        message_digest: "ccc".to_string(),
    };
    let second = PrePushMarker {
        target_head: "ddd".to_string(),
        candidate_hash: "eee".to_string(),
        message_digest: "fff".to_string(),
        ..first.clone()
    };

    let comments = vec![first.encode(), "unrelated comment".to_string(), second.encode()];

    assert_eq!(latest_pre_push_marker(&comments), Some(second));
}
