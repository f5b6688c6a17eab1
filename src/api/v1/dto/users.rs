/*
 * Responsibility
 * - Users の request/response DTO
 * - validation (形式チェック) 用の validate()
 *   - username は email 形式
 *   - password は 8 文字以上、英字・数字・記号をそれぞれ 1 つ以上
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::user_repo::{ProfileUpdate, UserRow};
use crate::services::users::{Page, Registration};

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";
const USERNAME_MAX_LEN: usize = 255;
const NAME_MAX_LEN: usize = 100;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const PASSWORD_POLICY_MESSAGE: &str = "password must be at least 8 characters long, include letters, numbers, and one special character";

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username (your email) is required");
        }
        validate_username(&self.username)?;
        if self.password.is_empty() {
            return Err("password is required");
        }
        if !meets_password_policy(&self.password) {
            return Err(PASSWORD_POLICY_MESSAGE);
        }
        validate_names(self.firstname.as_deref(), self.lastname.as_deref())
    }

    pub fn into_registration(self) -> Registration {
        Registration {
            username: self.username,
            password: self.password,
            firstname: blank_to_none(self.firstname),
            lastname: blank_to_none(self.lastname),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.username {
            validate_username(name)?;
        }
        validate_names(self.firstname.as_deref(), self.lastname.as_deref())
    }

    pub fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username,
            firstname: self.firstname,
            lastname: self.lastname,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.old_password.is_empty() {
            return Err("oldPassword is required");
        }
        if !meets_password_policy(&self.new_password) {
            return Err(PASSWORD_POLICY_MESSAGE);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    /// Zero-based page and a size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn resolve(&self) -> (u32, u32) {
        let size = self
            .size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (self.page.unwrap_or(0), size)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub uuid: Uuid,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            username: row.username,
            firstname: row.firstname,
            lastname: row.lastname,
            role: row.role,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPageResponse {
    pub content: Vec<UserResponse>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl From<Page<UserRow>> for UserPageResponse {
    fn from(p: Page<UserRow>) -> Self {
        let size = i64::from(p.size.max(1));
        Self {
            content: p.items.into_iter().map(UserResponse::from).collect(),
            page: p.page,
            size: p.size,
            total_elements: p.total,
            total_pages: (p.total + size - 1) / size,
        }
    }
}

pub fn meets_password_policy(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LEN
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

fn validate_username(raw: &str) -> Result<(), &'static str> {
    let name = raw.trim();
    if name.len() > USERNAME_MAX_LEN {
        return Err("username must be <= 255 chars");
    }
    if !looks_like_email(name) {
        return Err("username must be a valid email address");
    }
    Ok(())
}

fn validate_names(first: Option<&str>, last: Option<&str>) -> Result<(), &'static str> {
    if let Some(f) = first
        && f.chars().count() > NAME_MAX_LEN
    {
        return Err("firstname must be <= 100 chars");
    }
    if let Some(l) = last
        && l.chars().count() > NAME_MAX_LEN
    {
        return Err("lastname must be <= 100 chars");
    }
    Ok(())
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .all(|label| !label.is_empty())
        && domain.contains('.')
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
            firstname: None,
            lastname: None,
        }
    }

    #[test]
    fn password_policy() {
        assert!(meets_password_policy("Canopy#1"));
        assert!(!meets_password_policy("Canopy1"));
        assert!(!meets_password_policy("Canopy##"));
        assert!(!meets_password_policy("12345678#"));
        assert!(!meets_password_policy("Canopy123"));
    }

    #[test]
    fn username_must_be_email() {
        assert!(create("jumper@dz.com", "Canopy#1").validate().is_ok());
        assert!(create("jumper", "Canopy#1").validate().is_err());
        assert!(create("jumper@dz", "Canopy#1").validate().is_err());
        assert!(create("a@b@dz.com", "Canopy#1").validate().is_err());
        assert!(create("  ", "Canopy#1").validate().is_err());
    }

    #[test]
    fn weak_password_is_rejected_with_policy_message() {
        assert_eq!(
            create("jumper@dz.com", "short").validate(),
            Err(PASSWORD_POLICY_MESSAGE)
        );
    }

    #[test]
    fn update_allows_partial_fields() {
        let req = UpdateUserRequest {
            username: None,
            firstname: Some("Ana".into()),
            lastname: None,
        };
        assert!(req.validate().is_ok());

        let req = UpdateUserRequest {
            username: Some("not-an-email".into()),
            firstname: None,
            lastname: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn change_password_reads_camel_case() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"oldPassword":"Canopy#1","newPassword":"Canopy#2"}"#)
                .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn page_query_defaults_and_clamps() {
        let q = PageQuery {
            page: None,
            size: None,
        };
        assert_eq!(q.resolve(), (0, DEFAULT_PAGE_SIZE));

        let q = PageQuery {
            page: Some(3),
            size: Some(10_000),
        };
        assert_eq!(q.resolve(), (3, MAX_PAGE_SIZE));
    }
}
