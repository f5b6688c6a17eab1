use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Skydiver,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Skydiver => "SKYDIVER",
            Role::Admin => "ADMIN",
        }
    }

    /// Authority string handed to downstream authorization checks.
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SKYDIVER" => Ok(Role::Skydiver),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// The slice of a user record the auth layer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub active: bool,
}

/// Usernames are e-mail addresses compared case-insensitively.
///
/// Login, registration and the request gate all go through this, so a lookup
/// never diverges on casing or stray whitespace.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_username("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" SKYDIVER ".parse::<Role>(), Ok(Role::Skydiver));
        assert!("ROOT".parse::<Role>().is_err());
    }

    #[test]
    fn authority_is_prefixed() {
        assert_eq!(Role::Skydiver.authority(), "ROLE_SKYDIVER");
    }
}
