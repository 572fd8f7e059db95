//! Hidden HTML-comment markers embedded in bot replies.
//!
//! These are the only persistent record the bot has of its own past
//! actions (§4.3, §4.4): an invocation marker makes a command reply
//! idempotent, and a pre-push marker makes the integration protocol
//! crash-safe across restarts.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "markers_tests.rs"]
mod tests;

/// Marks a comment authored by the bot account as an intentional
/// self-command rather than a dispatcher artifact.
pub const SELF_COMMAND_MARKER: &str = "<!-- Valid self-command -->";

lazy_static! {
    static ref INVOCATION_MARKER_RE: Regex =
        Regex::new(r"<!-- review-warden:invocation '([^']+)' -->")
            .expect("invocation marker regex is valid");
    static ref PRE_PUSH_MARKER_RE: Regex =
        Regex::new(r"<!-- review-warden:pre-push (\{.*?\}) -->")
            .expect("pre-push marker regex is valid");
}

/// Renders the hidden marker that ties a dispatcher reply back to the
/// invocation it answers.
pub fn encode_invocation_marker(invocation_id: &str) -> String {
    format!("<!-- review-warden:invocation '{invocation_id}' -->")
}

/// Finds the invocation id embedded in a bot reply, if any.
pub fn extract_invocation_id(comment_body: &str) -> Option<String> {
    INVOCATION_MARKER_RE
        .captures(comment_body)
        .map(|caps| caps[1].to_string())
}

/// `true` if an invocation marker for `invocation_id` already exists among
/// `replies` — the dispatcher's idempotence check.
pub fn already_handled(invocation_id: &str, replies: &[String]) -> bool {
    replies
        .iter()
        .any(|body| extract_invocation_id(body).as_deref() == Some(invocation_id))
}

/// `true` if `body` carries the marker that makes a bot-authored comment a
/// valid self-command rather than something to ignore.
pub fn has_self_command_marker(body: &str) -> bool {
    body.contains(SELF_COMMAND_MARKER)
}

/// The state recorded by the "Going to push as commit ..." comment,
/// per §4.4 step 1. Round-trips through a JSON blob inside the marker
/// comment so a restarted bot can recover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrePushMarker {
    pub pull_request_id: u64,
    pub target_branch: String,
    /// The target branch head (`T`) observed when the candidate was built.
    pub target_head: String,
    pub candidate_hash: String,
    /// Digest of the commit message, used to recognize the candidate after
    /// it lands even though its hash changes once rebased onto a new `T`.
    pub message_digest: String,
}

impl PrePushMarker {
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).expect("PrePushMarker always serializes");
        format!("<!-- review-warden:pre-push {json} -->")
    }

    pub fn decode(comment_body: &str) -> Option<Self> {
        let captured = PRE_PUSH_MARKER_RE.captures(comment_body)?;
        serde_json::from_str(&captured[1]).ok()
    }
}

/// Finds the most recent pre-push marker among a PR's comments, in the
/// order the comments were returned (newest last).
pub fn latest_pre_push_marker(comments: &[String]) -> Option<PrePushMarker> {
    comments.iter().rev().find_map(|c| PrePushMarker::decode(c))
}
