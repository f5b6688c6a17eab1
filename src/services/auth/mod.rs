pub mod credentials;
pub mod directory;
pub mod factory;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod token_issuer;

pub use factory::build_auth_service;
pub use principal::{Principal, Role};
pub use token_issuer::AuthService;

use crate::repos::error::RepoError;
use jwt::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("{0}")]
    Internal(String),
}
