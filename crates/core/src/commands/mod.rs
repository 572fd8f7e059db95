//! The command registry (C1): the static table of slash-commands the
//! dispatcher (C6) knows about, keyed by name, plus the capability
//! descriptor each handler declares about where and by whom it may be
//! invoked.

pub mod dispatcher;
pub mod handlers;
pub mod parser;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

/// Where a command invocation may have come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationSource {
    Body,
    Comment,
    Review,
}

/// The minimum role an invoker must hold for a command to be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    Anyone,
    Author,
    Committer,
    Reviewer,
    Integrator,
    /// Only the bot's own account, and only with the hidden
    /// `<!-- Valid self-command -->` marker present.
    BotSelf,
}

/// A single parsed command invocation, before authorization or dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub user: String,
    pub source: InvocationSource,
    pub command: String,
    pub arguments: String,
    /// Position among same-source inputs (comment index, review index; 0
    /// for the body, which has at most one invocation per revision).
    pub location: usize,
    pub has_self_command_marker: bool,
}

impl Invocation {
    /// A stable id for idempotence-marker purposes: same invocation, run
    /// twice, must yield the same id.
    pub fn invocation_id(&self) -> String {
        format!(
            "{:?}:{}:{}",
            self.source,
            self.location,
            self.command.to_ascii_lowercase()
        )
    }
}

/// Declares where and by whom a handler may be invoked. Mirrors §4.3's
/// authorization policy verbatim.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub allowed_in_pull_request: bool,
    pub allowed_in_commit: bool,
    pub allowed_in_body: bool,
    pub required_role: RequiredRole,
    pub self_command_allowed: bool,
}

/// The built-in commands, in the order they're documented to `/help`.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        allowed_in_pull_request: true,
        allowed_in_commit: true,
        allowed_in_body: false,
        required_role: RequiredRole::Anyone,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "integrate",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: false,
        required_role: RequiredRole::Author,
        self_command_allowed: true,
    },
    CommandSpec {
        name: "sponsor",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: false,
        required_role: RequiredRole::Committer,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "reviewers",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: true,
        required_role: RequiredRole::Committer,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "contributor",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: true,
        required_role: RequiredRole::Author,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "issue",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: true,
        required_role: RequiredRole::Author,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "solves",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: true,
        required_role: RequiredRole::Author,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "summary",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: true,
        required_role: RequiredRole::Author,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "label",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: false,
        required_role: RequiredRole::Committer,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "csr",
        allowed_in_pull_request: true,
        allowed_in_commit: false,
        allowed_in_body: false,
        required_role: RequiredRole::Author,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "backport",
        allowed_in_pull_request: true,
        allowed_in_commit: true,
        allowed_in_body: false,
        required_role: RequiredRole::Committer,
        self_command_allowed: false,
    },
    CommandSpec {
        name: "branch",
        allowed_in_pull_request: false,
        allowed_in_commit: true,
        allowed_in_body: false,
        required_role: RequiredRole::Integrator,
        self_command_allowed: false,
    },
];

/// Looks up a built-in command by name, case-insensitively.
pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}
