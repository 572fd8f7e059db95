use super::*;
use review_warden_forge::census::Role;
use std::io::Write;

fn write_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_parses_entries_into_roles() {
    let file = write_file(
        r#"
        revision = "2026-01-01"

        [[entries]]
        login = "alice"
        project = "jdk"
        role = "committer"

        [[entries]]
        login = "bob"
        project = "jdk"
        role = "lead"
        "#,
    );

    let census = load(file.path()).unwrap();

    assert_eq!(census.revision, "2026-01-01");
    assert_eq!(census.role_on("alice", "jdk"), Some(Role::Committer));
    assert_eq!(census.role_on("bob", "jdk"), Some(Role::Lead));
    assert_eq!(census.role_on("carol", "jdk"), None);
}

#[test]
fn load_defaults_to_an_empty_role_list_when_entries_is_absent() {
    let file = write_file(r#"revision = "empty""#);

    let census = load(file.path()).unwrap();

    assert_eq!(census.role_on("alice", "jdk"), None);
}

#[test]
fn load_fails_on_a_missing_file() {
    let result = load(Path::new("/nonexistent/census.toml"));

    assert!(result.is_err());
}
