/*
 * Responsibility
 * - POST /auth/login の request/response DTO
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::Role;
use crate::services::auth::token_issuer::IssuedToken;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Blank fields never reach the credential check.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

impl From<IssuedToken> for LoginResponse {
    fn from(t: IssuedToken) -> Self {
        Self {
            token: t.token,
            username: t.username,
            role: t.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_blank() {
        let req: LoginRequest = serde_json::from_str(r#"{"username":"a@b.co"}"#).unwrap();
        assert!(!req.is_complete());
    }

    #[test]
    fn response_serializes_role_uppercase() {
        let res = LoginResponse {
            token: "t".into(),
            username: "a@b.co".into(),
            role: Role::Skydiver,
        };
        let json = serde_json::to_value(res).unwrap();
        assert_eq!(json["role"], "SKYDIVER");
    }
}
