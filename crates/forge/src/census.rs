//! Census/ACL repository: maps a forge user to a role within a project at a
//! given repository revision.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::Error;

#[cfg(test)]
#[path = "census_tests.rs"]
mod tests;

/// A role a contributor may hold on a project, from least to most trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// No recognized standing; anyone can author a PR.
    Contributor,
    /// May be credited as a reviewer whose approval counts toward jcheck.
    Reviewer,
    /// May push directly and sponsor PRs on behalf of non-committers.
    Committer,
    /// May run integrator-only commands such as `/branch`.
    Integrator,
    /// Project lead; superset of integrator.
    Lead,
}

/// An immutable snapshot of contributor → role mappings, pinned to a census
/// repository revision.
#[derive(Debug, Clone)]
pub struct CensusInstance {
    /// The census repository revision this snapshot was read at.
    pub revision: String,
    roles: HashMap<String, Vec<(String, Role)>>,
}

impl CensusInstance {
    /// Builds a snapshot from `(login, project, role)` triples.
    pub fn new(revision: impl Into<String>, entries: Vec<(String, String, Role)>) -> Self {
        let mut roles: HashMap<String, Vec<(String, Role)>> = HashMap::new();
        for (login, project, role) in entries {
            roles.entry(login).or_default().push((project, role));
        }
        Self { revision: revision.into(), roles }
    }

    /// Returns the highest role `login` holds on `project`, if any.
    pub fn role_on(&self, login: &str, project: &str) -> Option<Role> {
        self.roles
            .get(login)?
            .iter()
            .filter(|(p, _)| p == project)
            .map(|(_, role)| *role)
            .max()
    }

    /// Returns `true` if `login` holds at least `Role::Committer` on `project`.
    pub fn is_committer(&self, login: &str, project: &str) -> bool {
        self.role_on(login, project).is_some_and(|r| r >= Role::Committer)
    }
}

/// Source of census snapshots.
#[async_trait]
pub trait CensusRepository: Send + Sync {
    /// Returns the current census snapshot.
    async fn current(&self) -> Result<CensusInstance, Error>;
}

/// A static in-memory census, suitable for tests and for operators who keep
/// a small hand-maintained role map instead of a full census checkout.
pub struct InMemoryCensusRepository {
    instance: CensusInstance,
}

impl InMemoryCensusRepository {
    /// Builds a repository that always returns `instance`.
    pub fn new(instance: CensusInstance) -> Self {
        Self { instance }
    }
}

#[async_trait]
impl CensusRepository for InMemoryCensusRepository {
    async fn current(&self) -> Result<CensusInstance, Error> {
        Ok(self.instance.clone())
    }
}
