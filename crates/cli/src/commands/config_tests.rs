use super::*;
use std::io::Write;

fn write_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn validate_accepts_a_well_formed_config() {
    let file = write_file(
        r#"
        censusRepo = "census"
        enableCsr = true
        "#,
    );

    let result = validate(&file.path().to_path_buf()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn validate_rejects_malformed_toml() {
    let file = write_file("this is not [ valid toml");

    let result = validate(&file.path().to_path_buf()).await;

    assert!(matches!(result, Err(CliError::ValidationFailed(_))));
}

#[tokio::test]
async fn validate_fails_on_a_missing_file() {
    let result = validate(&PathBuf::from("/nonexistent/config.toml")).await;

    assert!(matches!(result, Err(CliError::ConfigError(_))));
}
