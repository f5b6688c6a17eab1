use tracing::{error, info};

use crate::services::auth::AuthError;
use crate::services::auth::credentials::CredentialVerifier;
use crate::services::auth::directory::PrincipalDirectory;
use crate::services::auth::jwt::TokenCodec;
use crate::services::auth::principal::Role;

/// Result of a successful login.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// Auth entry point shared through `AppState`.
///
/// - login: credential check, then token issuance (two separate steps)
/// - the request gate reads `codec()` and `directory()` directly
#[derive(Clone, Debug)]
pub struct AuthService {
    codec: TokenCodec,
    directory: PrincipalDirectory,
    credentials: CredentialVerifier,
}

impl AuthService {
    pub fn new(codec: TokenCodec, directory: PrincipalDirectory) -> Self {
        let credentials = CredentialVerifier::new(directory.clone());
        Self {
            codec,
            directory,
            credentials,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn directory(&self) -> &PrincipalDirectory {
        &self.directory
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let principal = self.credentials.authenticate(username, password).await?;

        let token = self
            .codec
            .issue(&principal.username, principal.role)
            .map_err(|e| {
                error!(error = %e, "failed to sign session token");
                AuthError::Token(e)
            })?;

        info!(user_id = principal.id, role = %principal.role, "session token issued");

        Ok(IssuedToken {
            token,
            username: principal.username,
            role: principal.role,
        })
    }
}
