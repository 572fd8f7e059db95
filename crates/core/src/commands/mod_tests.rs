use super::*;

#[test]
fn find_command_is_case_insensitive() {
    assert!(find_command("Integrate").is_some());
    assert!(find_command("INTEGRATE").is_some());
}

#[test]
fn find_command_returns_none_for_unknown_name() {
    assert!(find_command("frobnicate").is_none());
}

#[test]
fn branch_is_commit_only_and_integrator_gated() {
    let spec = find_command("branch").unwrap();

    assert!(!spec.allowed_in_pull_request);
    assert!(spec.allowed_in_commit);
    assert_eq!(spec.required_role, RequiredRole::Integrator);
}

#[test]
fn invocation_id_is_stable_for_the_same_invocation() {
    let invocation = Invocation {
        user: "alice".to_string(),
        source: InvocationSource::Comment,
        command: "Integrate".to_string(),
        arguments: String::new(),
        location: 2,
        has_self_command_marker: false,
    };

    assert_eq!(invocation.invocation_id(), invocation.invocation_id());
    assert_eq!(invocation.invocation_id(), "Comment:2:integrate");
}
