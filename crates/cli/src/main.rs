//! # review-warden CLI
//!
//! Command-line interface for the review-warden bot.
//!
//! This binary lets an operator dry-run a reconciliation pass against a
//! live pull request, and validate a `.forge-bot/config.toml` file offline,
//! without running the long-lived webhook server.
//!
//! # Commands
//!
//! - `check` - Dry-run reconciliation against a pull request
//! - `config validate` - Validate a bot config file
//!
//! # Examples
//!
//! ```bash
//! review-warden check --repo owner/repo --pr 123
//! review-warden config validate .forge-bot/config.toml
//! ```

use clap::{Parser, Subcommand};
use tracing::{error, instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command implementations for the CLI.
mod commands;

/// Error types specific to the CLI.
mod errors;

use commands::check::CheckArgs;
use commands::config::ConfigCommands;
use errors::CliError;

/// Command-line interface structure for review-warden.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the review-warden CLI.
#[derive(Subcommand)]
enum Commands {
    /// Dry-run reconciliation against a pull request
    Check(CheckArgs),

    /// Validate a bot config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_env("REVIEW_WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => commands::check::execute(args).await.map_err(|e| {
            error!("error dry-running check: {e}");
            e
        }),
        Commands::Config(cmd) => commands::config::execute(cmd).await.map_err(|e| {
            error!("error validating config: {e}");
            e
        }),
    }
}
