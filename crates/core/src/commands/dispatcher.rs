//! Command dispatcher (C6): authorizes invocations against their
//! [`CommandSpec`], skips ones already handled, runs the built-in
//! handler, and pairs exactly one reply with the hidden invocation
//! marker.

use super::handlers::{self, HandlerOutcome};
use super::{find_command, Invocation, InvocationSource, RequiredRole};
use crate::errors::CoreError;
use crate::markers::{already_handled, encode_invocation_marker};
use review_warden_forge::census::Role;

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

/// Whether the invocation's surrounding entity is a pull request or a
/// bare commit, per §4.3's `allowedInPullRequest`/`allowedInCommit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTarget {
    PullRequest,
    Commit,
}

/// What the dispatcher needs to know about the invoker to authorize a
/// command, resolved by the caller from census + PR identity.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    pub pr_author: String,
    pub invoker_role: Option<Role>,
    pub is_bot_account: bool,
}

/// One fully processed invocation: the reply to post (with its marker
/// already embedded) and, on success, the effect to apply.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub invocation_id: String,
    pub reply: String,
    pub outcome: Option<HandlerOutcome>,
}

/// Checks `invocation` against `spec`'s declared capabilities and the
/// invoker's role. Returns the canonical rejection message on failure.
pub fn authorize(
    spec: &super::CommandSpec,
    invocation: &Invocation,
    target: DispatchTarget,
    ctx: &AuthorizationContext,
) -> Result<(), String> {
    if invocation.source == InvocationSource::Body && !spec.allowed_in_body {
        return Err(format!(
            "The command `/{}` cannot be used in the pull request body",
            spec.name
        ));
    }
    match target {
        DispatchTarget::PullRequest if !spec.allowed_in_pull_request => {
            return Err(format!("The command `/{}` can only be used in commits", spec.name));
        }
        DispatchTarget::Commit if !spec.allowed_in_commit => {
            return Err(format!(
                "The command `/{}` can only be used in pull requests",
                spec.name
            ));
        }
        _ => {}
    }

    if ctx.is_bot_account {
        if spec.self_command_allowed && invocation.has_self_command_marker {
            return Ok(());
        }
        if !spec.self_command_allowed {
            return Err(format!(
                "The command `/{}` can only be invoked by the bot itself",
                spec.name
            ));
        }
    }

    match spec.required_role {
        RequiredRole::Anyone => Ok(()),
        RequiredRole::Author => {
            if invocation.user == ctx.pr_author {
                Ok(())
            } else {
                Err("Only the author of this pull request can use this command".to_string())
            }
        }
        RequiredRole::Reviewer => role_at_least(ctx, Role::Reviewer, "reviewers"),
        RequiredRole::Committer => role_at_least(ctx, Role::Committer, "committers"),
        RequiredRole::Integrator => role_at_least(ctx, Role::Integrator, "integrators"),
        RequiredRole::BotSelf => Err(format!(
            "The command `/{}` can only be invoked by the bot itself",
            spec.name
        )),
    }
}

fn role_at_least(ctx: &AuthorizationContext, minimum: Role, plural_role_name: &str) -> Result<(), String> {
    match ctx.invoker_role {
        Some(role) if role >= minimum => Ok(()),
        _ => Err(format!("Only {plural_role_name} can use this command")),
    }
}

/// Authorizes, deduplicates and runs `invocation`, returning the reply to
/// post. `existing_replies` is every bot reply already posted after this
/// invocation (for the idempotence check); `None` means already handled.
pub fn dispatch(
    invocation: &Invocation,
    target: DispatchTarget,
    ctx: &AuthorizationContext,
    existing_replies: &[String],
) -> Result<Option<DispatchResult>, CoreError> {
    let invocation_id = invocation.invocation_id();
    if already_handled(&invocation_id, existing_replies) {
        return Ok(None);
    }

    let Some(spec) = find_command(&invocation.command) else {
        let outcome = run_handler(&invocation.command, &invocation.arguments)?;
        return Ok(Some(finalize(invocation_id, outcome)));
    };

    if let Err(message) = authorize(spec, invocation, target, ctx) {
        return Ok(Some(finalize(
            invocation_id,
            HandlerOutcome {
                reply: message,
                effect: handlers::Effect::None,
            },
        )));
    }

    let outcome = run_handler(&invocation.command, &invocation.arguments)?;
    Ok(Some(finalize(invocation_id, outcome)))
}

/// Runs a built-in handler, converting a [`CoreError::UserInput`] into a
/// reply rather than letting it abort the whole invocation: per its own
/// contract, a malformed invocation is "surfaced as a single PR reply;
/// state unchanged", not a reason to fail the entire work item.
fn run_handler(command: &str, arguments: &str) -> Result<HandlerOutcome, CoreError> {
    match handlers::handle(command, arguments) {
        Ok(outcome) => Ok(outcome),
        Err(CoreError::UserInput(message)) => Ok(HandlerOutcome {
            reply: message,
            effect: handlers::Effect::None,
        }),
        Err(other) => Err(other),
    }
}

fn finalize(invocation_id: String, outcome: HandlerOutcome) -> DispatchResult {
    let reply = format!("{}\n\n{}", outcome.reply, encode_invocation_marker(&invocation_id));
    DispatchResult {
        invocation_id,
        reply,
        outcome: Some(outcome),
    }
}
