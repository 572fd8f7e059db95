use super::*;
use crate::commands::InvocationSource;

fn invocation(user: &str, command: &str, arguments: &str, source: InvocationSource) -> Invocation {
    Invocation {
        user: user.to_string(),
        source,
        command: command.to_string(),
        arguments: arguments.to_string(),
        location: 0,
        has_self_command_marker: false,
    }
}

fn ctx(author: &str, role: Option<Role>) -> AuthorizationContext {
    AuthorizationContext {
        pr_author: author.to_string(),
        invoker_role: role,
        is_bot_account: false,
    }
}

#[test]
fn author_only_command_rejects_non_authors() {
    let spec = find_command("integrate").unwrap();
    let inv = invocation("mallory", "integrate", "", InvocationSource::Comment);

    let result = authorize(spec, &inv, DispatchTarget::PullRequest, &ctx("alice", None));

    assert!(result.is_err());
}

#[test]
fn author_only_command_accepts_the_author() {
    let spec = find_command("integrate").unwrap();
    let inv = invocation("alice", "integrate", "", InvocationSource::Comment);

    let result = authorize(spec, &inv, DispatchTarget::PullRequest, &ctx("alice", None));

    assert!(result.is_ok());
}

#[test]
fn committer_command_rejects_insufficient_role() {
    let spec = find_command("sponsor").unwrap();
    let inv = invocation("bob", "sponsor", "", InvocationSource::Comment);

    let result = authorize(spec, &inv, DispatchTarget::PullRequest, &ctx("alice", Some(Role::Reviewer)));

    assert!(result.is_err());
}

#[test]
fn committer_command_accepts_a_committer_or_above() {
    let spec = find_command("sponsor").unwrap();
    let inv = invocation("bob", "sponsor", "", InvocationSource::Comment);

    let result = authorize(spec, &inv, DispatchTarget::PullRequest, &ctx("alice", Some(Role::Integrator)));

    assert!(result.is_ok());
}

#[test]
fn body_disallowed_command_is_rejected_in_the_body() {
    let spec = find_command("integrate").unwrap();
    let inv = invocation("alice", "integrate", "", InvocationSource::Body);

    let result = authorize(spec, &inv, DispatchTarget::PullRequest, &ctx("alice", None));

    assert!(result.unwrap_err().contains("pull request body"));
}

#[test]
fn commit_only_command_is_rejected_on_a_pull_request() {
    let spec = find_command("branch").unwrap();
    let inv = invocation("alice", "branch", "jdk22", InvocationSource::Comment);

    let result = authorize(spec, &inv, DispatchTarget::PullRequest, &ctx("alice", Some(Role::Integrator)));

    assert!(result.unwrap_err().contains("pull requests"));
}

#[test]
fn bot_self_command_requires_the_marker() {
    let spec = find_command("integrate").unwrap();
    let mut inv = invocation("review-warden-bot", "integrate", "auto", InvocationSource::Comment);
    let bot_ctx = AuthorizationContext {
        pr_author: "alice".to_string(),
        invoker_role: None,
        is_bot_account: true,
    };

    let rejected = authorize(spec, &inv, DispatchTarget::PullRequest, &bot_ctx);
    assert!(rejected.is_err());

    inv.has_self_command_marker = true;
    let accepted = authorize(spec, &inv, DispatchTarget::PullRequest, &bot_ctx);
    assert!(accepted.is_ok());
}

#[test]
fn dispatch_skips_already_handled_invocations() {
    let inv = invocation("alice", "integrate", "", InvocationSource::Comment);
    let marker = crate::markers::encode_invocation_marker(&inv.invocation_id());

    let result = dispatch(&inv, DispatchTarget::PullRequest, &ctx("alice", None), &[marker]).unwrap();

    assert!(result.is_none());
}

#[test]
fn dispatch_returns_a_reply_with_the_invocation_marker() {
    let inv = invocation("alice", "help", "", InvocationSource::Comment);

    let result = dispatch(&inv, DispatchTarget::PullRequest, &ctx("alice", None), &[])
        .unwrap()
        .expect("not previously handled");

    assert!(result.reply.contains("review-warden:invocation"));
    assert!(crate::markers::already_handled(&result.invocation_id, &[result.reply.clone()]));
}

#[test]
fn dispatch_reports_unknown_commands_without_authorization() {
    let inv = invocation("alice", "frobnicate", "", InvocationSource::Comment);

    let result = dispatch(&inv, DispatchTarget::PullRequest, &ctx("alice", None), &[])
        .unwrap()
        .unwrap();

    assert!(result.reply.contains("Unknown command"));
}

#[test]
fn dispatch_turns_a_malformed_invocation_into_a_reply_instead_of_an_error() {
    let inv = invocation("alice", "reviewers", "not-a-number", InvocationSource::Comment);

    let result = dispatch(&inv, DispatchTarget::PullRequest, &ctx("alice", Some(Role::Committer)), &[])
        .unwrap()
        .unwrap();

    assert!(result.reply.contains("not a valid reviewer count"));
    assert_eq!(result.outcome.unwrap().effect, handlers::Effect::None);
}

#[test]
fn dispatch_rejects_unauthorized_invocations_with_a_reply_and_no_effect() {
    let inv = invocation("mallory", "integrate", "", InvocationSource::Comment);

    let result = dispatch(&inv, DispatchTarget::PullRequest, &ctx("alice", None), &[])
        .unwrap()
        .unwrap();

    assert!(result.reply.contains("Only the author"));
    assert_eq!(result.outcome.unwrap().effect, handlers::Effect::None);
}
