use super::*;
use std::io::Write;

fn write_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_census_file_parses_entries_into_roles() {
    let file = write_file(
        r#"
        revision = "2026-01-01"

        [[entries]]
        login = "alice"
        project = "jdk"
        role = "committer"
        "#,
    );

    let census = load_census_file(&file.path().to_path_buf()).unwrap();

    assert_eq!(census.revision, "2026-01-01");
    assert_eq!(census.role_on("alice", "jdk"), Some(Role::Committer));
}

#[test]
fn load_census_file_defaults_to_an_empty_role_list_when_entries_is_absent() {
    let file = write_file(r#"revision = "empty""#);

    let census = load_census_file(&file.path().to_path_buf()).unwrap();

    assert_eq!(census.role_on("alice", "jdk"), None);
}

#[test]
fn load_census_file_rejects_an_unknown_role() {
    let file = write_file(
        r#"
        revision = "2026-01-01"

        [[entries]]
        login = "alice"
        project = "jdk"
        role = "wizard"
        "#,
    );

    let result = load_census_file(&file.path().to_path_buf());

    assert!(result.is_err());
}

#[test]
fn load_census_file_fails_on_a_missing_file() {
    let result = load_census_file(&PathBuf::from("/nonexistent/census.toml"));

    assert!(result.is_err());
}
