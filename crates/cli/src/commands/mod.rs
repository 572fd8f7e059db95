/// The `check` command: a read-only dry run of reconciliation against a
/// live pull request.
pub mod check;

/// The `config` command group: validating `.forge-bot/config.toml`.
pub mod config;
