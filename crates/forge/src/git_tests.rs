use super::*;

#[tokio::test]
async fn null_git_plumbing_reports_a_configuration_error_instead_of_panicking() {
    let git = NullGitPlumbing;

    let result = git.materialize("openjdk/jdk", "deadbeef").await;

    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[tokio::test]
async fn null_git_plumbing_discard_is_a_harmless_no_op() {
    let git = NullGitPlumbing;
    let tree = WorkingTree { path: std::path::PathBuf::from("/tmp/x"), head: "deadbeef".to_string() };

    git.discard(tree).await;
}
