/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::repos::user_repo::UserRepo;
use crate::services::auth::AuthService;
use crate::services::auth::directory::PrincipalDirectory;
use crate::services::auth::jwt::{TokenCodec, TokenError};
use crate::services::clock::Clock;

pub fn build_auth_service(
    config: &Config,
    users: Arc<dyn UserRepo>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<AuthService>, ConfigError> {
    let codec = TokenCodec::new(&config.jwt_secret, config.jwt_expiration_minutes, clock)
        .map_err(|e| {
            tracing::error!(error = %e, "token codec rejected its configuration");
            match e {
                TokenError::InvalidTtl(_) => ConfigError::Invalid("JWT_EXPIRATION_MINUTES"),
                _ => ConfigError::Invalid("JWT_SECRET"),
            }
        })?;

    Ok(Arc::new(AuthService::new(codec, PrincipalDirectory::new(users))))
}
