//! GitHub App authentication: app-level JWT client and installation-token
//! exchange.

use jsonwebtoken::EncodingKey;
use octocrab::Octocrab;
use tracing::{info, instrument};

use crate::errors::Error;
use crate::models::User;

/// Creates an `Octocrab` client authenticated as the GitHub App itself using
/// a JWT signed with `private_key`, and returns it alongside the app's own
/// bot identity (used as the committer for commits made by the app, and to
/// recognize self-authored comments for the idempotence check in §4.3).
#[instrument(skip(private_key))]
pub async fn create_app_client(app_id: u64, private_key: &str) -> Result<(Octocrab, User), Error> {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
        .map_err(|e| Error::AuthError(format!("invalid app private key: {e}")))?;

    let octocrab = Octocrab::builder()
        .app(app_id.into(), key)
        .build()
        .map_err(|e| Error::AuthError(format!("failed to build app client: {e}")))?;

    info!(app_id, "created app-level github client");

    let app = octocrab
        .current()
        .app()
        .await
        .map_err(|e| Error::InvalidResponse(format!("failed to fetch app identity: {e}")))?;

    let user = User {
        id: app.id.into_inner(),
        login: app.name,
    };

    Ok((octocrab, user))
}

/// Authenticates with GitHub using an installation access token for a
/// specific app installation, returning a new client scoped to it.
#[instrument(skip(octocrab))]
pub async fn authenticate_with_access_token(
    octocrab: &Octocrab,
    installation_id: u64,
    repository_owner: &str,
    source_repository: &str,
) -> Result<Octocrab, Error> {
    let (api_with_token, _) = octocrab
        .installation_and_token(installation_id.into())
        .await
        .map_err(|_| {
            Error::FailedToCreateAccessToken(
                repository_owner.to_string(),
                source_repository.to_string(),
                installation_id,
            )
        })?;

    info!(installation_id, "created access token for installation");

    Ok(api_with_token)
}

/// Creates a GitHub client authenticated with a static personal access
/// token, for operators who run the CLI against their own account rather
/// than through an app installation.
#[instrument(skip(token))]
pub fn create_token_client(token: &str) -> Result<Octocrab, Error> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| Error::AuthError(format!("failed to build token client: {e}")))
}
