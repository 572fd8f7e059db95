//! Command parser (C2): extracts invocations from PR body, comments and
//! review bodies.
//!
//! An invocation is a line beginning with `/<name>`, optionally followed
//! by arguments that continue on subsequent lines until the next
//! `/<name>` line or the end of input. A `/` on a non-leading line within
//! a comment is not a command.

use super::{Invocation, InvocationSource};
use crate::markers::has_self_command_marker;
use lazy_static::lazy_static;
use regex::Regex;

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;

lazy_static! {
    static ref COMMAND_LINE_RE: Regex =
        Regex::new(r"^/([A-Za-z][A-Za-z0-9_-]*)\s*(.*)$").expect("command line regex is valid");
}

/// A command name plus its (possibly multi-line) argument text, before
/// any authorization or identity is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub arguments: String,
}

/// Splits `text` into consecutive command blocks.
pub fn extract_commands(text: &str) -> Vec<ParsedCommand> {
    let mut commands = Vec::new();
    let mut current: Option<ParsedCommand> = None;

    for line in text.lines() {
        if let Some(caps) = COMMAND_LINE_RE.captures(line) {
            if let Some(finished) = current.take() {
                commands.push(finish(finished));
            }
            current = Some(ParsedCommand {
                name: caps[1].to_string(),
                arguments: caps[2].to_string(),
            });
        } else if let Some(open) = current.as_mut() {
            if !open.arguments.is_empty() || !line.trim().is_empty() {
                open.arguments.push('\n');
            }
            open.arguments.push_str(line);
        }
    }
    if let Some(finished) = current.take() {
        commands.push(finish(finished));
    }

    commands
}

fn finish(mut command: ParsedCommand) -> ParsedCommand {
    command.arguments = command.arguments.trim().to_string();
    command
}

/// Extracts invocations from the PR body (location is always 0 — at most
/// one invocation per command per body revision is meaningful).
pub fn invocations_from_body(user: &str, body: &str) -> Vec<Invocation> {
    extract_commands(body)
        .into_iter()
        .map(|c| Invocation {
            user: user.to_string(),
            source: InvocationSource::Body,
            command: c.name,
            arguments: c.arguments,
            location: 0,
            has_self_command_marker: false,
        })
        .collect()
}

/// Extracts invocations from one comment. `location` is the comment's
/// index in the PR's comment list.
pub fn invocations_from_comment(user: &str, location: usize, comment_body: &str) -> Vec<Invocation> {
    let self_marker = has_self_command_marker(comment_body);
    extract_commands(comment_body)
        .into_iter()
        .map(|c| Invocation {
            user: user.to_string(),
            source: InvocationSource::Comment,
            command: c.name,
            arguments: c.arguments,
            location,
            has_self_command_marker: self_marker,
        })
        .collect()
}

/// Extracts invocations from one review body. `location` is the review's
/// index in the PR's review list.
pub fn invocations_from_review(user: &str, location: usize, review_body: &str) -> Vec<Invocation> {
    extract_commands(review_body)
        .into_iter()
        .map(|c| Invocation {
            user: user.to_string(),
            source: InvocationSource::Review,
            command: c.name,
            arguments: c.arguments,
            location,
            has_self_command_marker: false,
        })
        .collect()
}
