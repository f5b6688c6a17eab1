use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::services::auth::AuthError;
use crate::services::auth::directory::PrincipalDirectory;
use crate::services::auth::password::{hash_password, verify_password};
use crate::services::auth::principal::Principal;

/// Checks a username/password pair against the stored hash.
///
/// Unknown user, inactive user and wrong password all produce the same
/// `InvalidCredentials`. When no account matches, a throwaway hash is still
/// verified so the two paths take comparable time.
#[derive(Clone, Debug)]
pub struct CredentialVerifier {
    directory: PrincipalDirectory,
}

impl CredentialVerifier {
    pub fn new(directory: PrincipalDirectory) -> Self {
        Self { directory }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let account = self.directory.find_active_account(username).await?;

        let (stored_hash, principal) = match account {
            Some(a) => (Some(a.password_hash), Some(a.principal)),
            None => (None, None),
        };

        let plain = password.to_string();
        let matches = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&plain, &hash),
            None => {
                if let Some(dummy) = dummy_hash() {
                    verify_password(&plain, dummy);
                }
                false
            }
        })
        .await
        .map_err(|e| AuthError::Internal(format!("password check task failed: {e}")))?;

        match principal {
            Some(principal) if matches => {
                debug!(user_id = principal.id, "credentials accepted");
                Ok(principal)
            }
            _ => {
                warn!(username = %username.trim(), "failed login attempt");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("no-such-user-placeholder").ok())
        .as_deref()
}
