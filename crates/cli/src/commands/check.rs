//! The `review-warden check` command: runs a dry-run reconciliation pass
//! against a live pull request and prints the declarative surface it
//! computed, without posting a comment, applying a label, or attempting
//! integration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{info, instrument};

use review_warden_core::jcheck::StaticJcheckFacade;
use review_warden_core::state_machine::Reconciliation;
use review_warden_core::ReviewWarden;
use review_warden_forge::auth;
use review_warden_forge::census::{CensusInstance, InMemoryCensusRepository, Role};
use review_warden_forge::git::NullGitPlumbing;
use review_warden_forge::github::GitHubForge;
use review_warden_forge::models::{CheckConclusion, CheckStatus};

use crate::errors::CliError;

/// Arguments for `review-warden check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Repository to check, as `owner/name`.
    #[arg(short, long)]
    pub repo: String,

    /// Pull request number to check.
    #[arg(long = "pr")]
    pub pr_number: u64,

    /// Personal access token to authenticate with. Falls back to the
    /// `GITHUB_TOKEN` environment variable.
    #[arg(long)]
    pub token: Option<String>,

    /// A static census file, same shape the server reads, for resolving
    /// reviewer roles. Without one, every contributor is treated as
    /// having no recognized role.
    #[arg(long)]
    pub census_file: Option<PathBuf>,
}

#[instrument(skip(args))]
pub async fn execute(args: CheckArgs) -> Result<(), CliError> {
    let token = args
        .token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .ok_or_else(|| CliError::AuthError("no token given via --token or GITHUB_TOKEN".to_string()))?;

    let octocrab = auth::create_token_client(&token)
        .map_err(|e| CliError::AuthError(format!("failed to build GitHub client: {e}")))?;
    let forge = Arc::new(GitHubForge::new(octocrab));

    let census_instance = match &args.census_file {
        Some(path) => load_census_file(path)?,
        None => CensusInstance::new("unconfigured", Vec::new()),
    };
    let census = Arc::new(InMemoryCensusRepository::new(census_instance));

    let jcheck = Arc::new(StaticJcheckFacade::new(CheckStatus {
        conclusion: CheckConclusion::Success,
        commit_hash: String::new(),
        summary: "no jcheck adapter configured; assuming passed for this dry run".to_string(),
        details: String::new(),
    }));
    let git = Arc::new(NullGitPlumbing);

    let warden = ReviewWarden::new(forge, census, jcheck, git, None);

    let reconciliation = warden
        .plan_pull_request(&args.repo, args.pr_number)
        .await
        .map_err(|e| CliError::Other(e.to_string()))?;

    print_report(&args.repo, args.pr_number, &reconciliation);

    info!(repo = args.repo, pr_number = args.pr_number, state = ?reconciliation.state, "dry run complete");

    Ok(())
}

fn print_report(repo: &str, pr_number: u64, reconciliation: &Reconciliation) {
    println!("review-warden check — {repo}#{pr_number}");
    println!("  state: {:?}", reconciliation.state);

    if reconciliation.labels_to_add.is_empty() && reconciliation.labels_to_remove.is_empty() {
        println!("  labels: unchanged ({} applied)", reconciliation.desired_labels.len());
    } else {
        if !reconciliation.labels_to_add.is_empty() {
            println!("  labels to add: {}", reconciliation.labels_to_add.join(", "));
        }
        if !reconciliation.labels_to_remove.is_empty() {
            println!("  labels to remove: {}", reconciliation.labels_to_remove.join(", "));
        }
    }

    match &reconciliation.pre_push_comment {
        Some(comment) => println!("  instructional comment:\n{comment}"),
        None => println!("  instructional comment: none"),
    }
}

fn load_census_file(path: &PathBuf) -> Result<CensusInstance, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::ConfigError(format!("failed to read census file: {e}")))?;

    #[derive(serde::Deserialize)]
    struct RoleFile {
        revision: String,
        #[serde(default)]
        entries: Vec<RoleEntry>,
    }

    #[derive(serde::Deserialize)]
    struct RoleEntry {
        login: String,
        project: String,
        role: String,
    }

    let parsed: RoleFile =
        toml::from_str(&raw).map_err(|e| CliError::ConfigError(format!("failed to parse census file: {e}")))?;

    let entries = parsed
        .entries
        .into_iter()
        .map(|e| {
            let role = match e.role.as_str() {
                "contributor" => Role::Contributor,
                "reviewer" => Role::Reviewer,
                "committer" => Role::Committer,
                "integrator" => Role::Integrator,
                "lead" => Role::Lead,
                other => return Err(CliError::ConfigError(format!("unknown role: {other}"))),
            };
            Ok((e.login, e.project, role))
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    Ok(CensusInstance::new(parsed.revision, entries))
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
