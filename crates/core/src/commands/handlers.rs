//! Built-in command handlers (§4.3's contract table).
//!
//! Each handler computes the markdown reply and the declarative effect an
//! invocation has on PR state; the dispatcher is responsible for
//! authorization, idempotence and actually posting the reply.

use crate::errors::CoreError;

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

/// The declarative state change a command asks for. The state machine
/// (C5) and integration protocol (C7) apply these; handlers never call
/// the forge directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    SetLabel { name: String, present: bool },
    SetReviewerCount { count: u8, role: Option<String> },
    AddContributor { name: String, email: String },
    RemoveContributor { name: String },
    AddIssueLink { id: String },
    RemoveIssueLink { id: String },
    SetSummary(String),
    SetIntegrateMode { pinned_hash: Option<String>, auto: Option<bool> },
    RequestSponsor { pinned_hash: Option<String> },
    SetCsrRequired(bool),
    RequestBackport { repo: String, branch: Option<String> },
    CreateBranch { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub reply: String,
    pub effect: Effect,
}

fn outcome(reply: impl Into<String>, effect: Effect) -> HandlerOutcome {
    HandlerOutcome {
        reply: reply.into(),
        effect,
    }
}

const HELP_TEXT: &str = "Available commands: /help, /integrate, /sponsor, /reviewers, \
/contributor, /issue, /solves, /summary, /label, /csr, /backport, /branch.";

/// Runs the named built-in handler against `arguments`. Callers (the
/// dispatcher) are expected to have already authorized the invocation.
pub fn handle(command: &str, arguments: &str) -> Result<HandlerOutcome, CoreError> {
    match command.to_ascii_lowercase().as_str() {
        "help" => Ok(outcome(HELP_TEXT, Effect::None)),
        "integrate" => handle_integrate(arguments),
        "sponsor" => handle_sponsor(arguments),
        "reviewers" => handle_reviewers(arguments),
        "contributor" => handle_contributor(arguments),
        "issue" | "solves" => handle_issue(arguments),
        "summary" => handle_summary(arguments),
        "label" => handle_label(arguments),
        "csr" => handle_csr(arguments),
        "backport" => handle_backport(arguments),
        "branch" => handle_branch(arguments),
        other => Ok(outcome(
            format!("Unknown command `/{other}` — for a list of available commands, use `/help`."),
            Effect::None,
        )),
    }
}

fn handle_integrate(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let arg = arguments.trim();
    match arg {
        "" => Ok(outcome(
            "Will integrate once all preconditions are met.",
            Effect::SetIntegrateMode { pinned_hash: None, auto: None },
        )),
        "auto" => Ok(outcome(
            "Will integrate automatically as soon as the change is ready.",
            Effect::SetIntegrateMode { pinned_hash: None, auto: Some(true) },
        )),
        "manual" => Ok(outcome(
            "Automatic integration cancelled; use `/integrate` to integrate manually.",
            Effect::SetIntegrateMode { pinned_hash: None, auto: Some(false) },
        )),
        hash => Ok(outcome(
            format!("Will integrate only if the target branch is still at `{hash}`."),
            Effect::SetIntegrateMode {
                pinned_hash: Some(hash.to_string()),
                auto: None,
            },
        )),
    }
}

fn handle_sponsor(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let arg = arguments.trim();
    let pinned_hash = if arg.is_empty() { None } else { Some(arg.to_string()) };
    Ok(outcome("Sponsoring this change.", Effect::RequestSponsor { pinned_hash }))
}

fn handle_reviewers(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let mut parts = arguments.split_whitespace();
    let count_text = parts
        .next()
        .ok_or_else(|| CoreError::UserInput("`/reviewers` requires a count".to_string()))?;
    let count: u8 = count_text
        .parse()
        .map_err(|_| CoreError::UserInput(format!("`{count_text}` is not a valid reviewer count")))?;
    if count > 5 {
        return Err(CoreError::UserInput(
            "the required reviewer count must be between 0 and 5".to_string(),
        ));
    }
    let role = parts.next().map(str::to_string);
    if let Some(role) = &role {
        let valid = ["reviewer", "committer", "author", "contributor"];
        if !valid.contains(&role.as_str()) {
            return Err(CoreError::UserInput(format!(
                "`{role}` is not a valid reviewer role"
            )));
        }
    }
    Ok(outcome(
        format!("Required reviewer count set to {count}."),
        Effect::SetReviewerCount { count, role },
    ))
}

fn handle_contributor(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let mut parts = arguments.splitn(2, ' ');
    let action = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();
    match action {
        "add" => {
            let (name, email) = rest
                .rsplit_once(' ')
                .ok_or_else(|| CoreError::UserInput("`/contributor add` requires a name and email".to_string()))?;
            Ok(outcome(
                format!("Added {name} <{email}> as a co-author."),
                Effect::AddContributor {
                    name: name.to_string(),
                    email: email.to_string(),
                },
            ))
        }
        "remove" => Ok(outcome(
            format!("Removed {rest} from the co-authors list."),
            Effect::RemoveContributor { name: rest.to_string() },
        )),
        other => Err(CoreError::UserInput(format!(
            "`{other}` is not a valid `/contributor` action — use `add` or `remove`"
        ))),
    }
}

fn handle_issue(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let arg = arguments.trim();
    if let Some(rest) = arg.strip_prefix("remove ") {
        return Ok(outcome(
            format!("Removed issue link {rest}."),
            Effect::RemoveIssueLink { id: rest.trim().to_string() },
        ));
    }
    let rest = arg.strip_prefix("add ").unwrap_or(arg);
    if rest.is_empty() {
        return Err(CoreError::UserInput("`/issue` requires at least one issue id".to_string()));
    }
    Ok(outcome(
        format!("Linked issue {rest}."),
        Effect::AddIssueLink { id: rest.to_string() },
    ))
}

fn handle_summary(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let text = arguments.trim();
    if text.is_empty() {
        return Err(CoreError::UserInput("`/summary` requires text".to_string()));
    }
    Ok(outcome(
        "Commit message summary updated.",
        Effect::SetSummary(text.to_string()),
    ))
}

fn handle_label(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let mut parts = arguments.split_whitespace();
    let action = parts
        .next()
        .ok_or_else(|| CoreError::UserInput("`/label` requires an action and a name".to_string()))?;
    let name = parts
        .next()
        .ok_or_else(|| CoreError::UserInput("`/label` requires a label name".to_string()))?;
    let present = match action {
        "add" => true,
        "remove" => false,
        other => {
            return Err(CoreError::UserInput(format!(
                "`{other}` is not a valid `/label` action — use `add` or `remove`"
            )))
        }
    };
    Ok(outcome(
        format!("Label `{name}` {}.", if present { "added" } else { "removed" }),
        Effect::SetLabel { name: name.to_string(), present },
    ))
}

fn handle_csr(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let required = match arguments.trim() {
        "" | "needed" => true,
        "unneeded" => false,
        other => {
            return Err(CoreError::UserInput(format!(
                "`{other}` is not a valid `/csr` argument — use `needed` or `unneeded`"
            )))
        }
    };
    Ok(outcome(
        if required {
            "Compatibility and specification review is now required."
        } else {
            "Compatibility and specification review is no longer required."
        },
        Effect::SetCsrRequired(required),
    ))
}

fn handle_backport(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let mut parts = arguments.split_whitespace();
    let repo = parts
        .next()
        .ok_or_else(|| CoreError::UserInput("`/backport` requires a target repository".to_string()))?;
    let branch = parts.next().map(str::to_string);
    Ok(outcome(
        format!("Backport to {repo} requested."),
        Effect::RequestBackport { repo: repo.to_string(), branch },
    ))
}

fn handle_branch(arguments: &str) -> Result<HandlerOutcome, CoreError> {
    let name = arguments.trim();
    if name.is_empty() {
        return Err(CoreError::UserInput("`/branch` requires a branch name".to_string()));
    }
    Ok(outcome(
        format!("Branch `{name}` created at this commit."),
        Effect::CreateBranch { name: name.to_string() },
    ))
}
