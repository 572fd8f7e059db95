//! Loads a static census from a small TOML file, for operators who keep a
//! hand-maintained role map instead of a full census repository checkout
//! (§6: "a minimal in-memory implementation ... for operators who keep a
//! small static role map"). No production census-repository adapter
//! ships; this is the supported alternative.

use std::path::Path;

use serde::Deserialize;

use review_warden_forge::census::{CensusInstance, Role};

use crate::errors::ServerError;

#[derive(Debug, Deserialize)]
struct RoleFile {
    revision: String,
    #[serde(default)]
    entries: Vec<RoleEntry>,
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    login: String,
    project: String,
    role: RoleToml,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RoleToml {
    Contributor,
    Reviewer,
    Committer,
    Integrator,
    Lead,
}

impl From<RoleToml> for Role {
    fn from(role: RoleToml) -> Self {
        match role {
            RoleToml::Contributor => Role::Contributor,
            RoleToml::Reviewer => Role::Reviewer,
            RoleToml::Committer => Role::Committer,
            RoleToml::Integrator => Role::Integrator,
            RoleToml::Lead => Role::Lead,
        }
    }
}

/// Reads a `[[entries]]`-shaped TOML file into a [`CensusInstance`].
pub fn load(path: &Path) -> Result<CensusInstance, ServerError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ServerError::Config(format!("failed to read census file {}: {e}", path.display())))?;

    let parsed: RoleFile = toml::from_str(&raw)
        .map_err(|e| ServerError::Config(format!("failed to parse census file {}: {e}", path.display())))?;

    let entries = parsed
        .entries
        .into_iter()
        .map(|e| (e.login, e.project, e.role.into()))
        .collect();

    Ok(CensusInstance::new(parsed.revision, entries))
}

#[cfg(test)]
#[path = "census_file_tests.rs"]
mod tests;
