//! The `review-warden config` command group: offline validation of
//! `.forge-bot/config.toml` against the shape the policy engine expects,
//! without touching a forge.

use std::path::PathBuf;

use clap::Subcommand;
use tracing::info;

use review_warden_core::config::{parse_config, ApplicationDefaults};

use crate::errors::CliError;

/// Subcommands under `review-warden config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Parse a `.forge-bot/config.toml` file and print the resolved
    /// configuration (defaults merged with the file's overrides).
    Validate {
        /// Path to the config file to validate.
        path: PathBuf,
    },
}

pub async fn execute(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Validate { path } => validate(&path).await,
    }
}

async fn validate(path: &PathBuf) -> Result<(), CliError> {
    let raw = std::fs::read(path)
        .map_err(|e| CliError::ConfigError(format!("failed to read {}: {e}", path.display())))?;

    let overrides = parse_config(&raw).map_err(|e| CliError::ValidationFailed(e.to_string()))?;
    let resolved = ApplicationDefaults::default().merge(overrides);

    let rendered = serde_json::to_string_pretty(&resolved)
        .map_err(|e| CliError::Other(format!("failed to render resolved config: {e}")))?;

    println!("{} is valid", path.display());
    println!("{rendered}");

    info!(path = %path.display(), "config validated");

    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
