use super::*;

fn sample() -> CensusInstance {
    CensusInstance::new(
        "rev-1",
        vec![
            ("alice".to_string(), "core".to_string(), Role::Committer),
            ("alice".to_string(), "core".to_string(), Role::Reviewer),
            ("bob".to_string(), "core".to_string(), Role::Reviewer),
        ],
    )
}

#[test]
fn role_on_returns_highest_role_for_project() {
    let census = sample();

    assert_eq!(census.role_on("alice", "core"), Some(Role::Committer));
}

#[test]
fn role_on_is_none_for_unknown_login() {
    let census = sample();

    assert_eq!(census.role_on("carol", "core"), None);
}

#[test]
fn role_on_is_none_for_unknown_project() {
    let census = sample();

    assert_eq!(census.role_on("alice", "other-project"), None);
}

#[test]
fn is_committer_reflects_role_ordering() {
    let census = sample();

    assert!(census.is_committer("alice", "core"));
    assert!(!census.is_committer("bob", "core"));
}

#[test]
fn role_ordering_places_lead_above_integrator() {
    assert!(Role::Lead > Role::Integrator);
    assert!(Role::Integrator > Role::Committer);
    assert!(Role::Committer > Role::Reviewer);
    assert!(Role::Reviewer > Role::Contributor);
}

#[tokio::test]
async fn in_memory_repository_returns_configured_instance() {
    let repo = InMemoryCensusRepository::new(sample());

    let census = repo.current().await.expect("census available");

    assert_eq!(census.revision, "rev-1");
    assert!(census.is_committer("alice", "core"));
}
