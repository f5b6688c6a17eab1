/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (status + ErrorReport を response extensions に載せる)
 * - JSON body の組み立ては middleware::failure が行う (path / timestamp が必要なため)
 * - RepoError / AuthError / JsonRejection を統一的に変換
 */
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;
use crate::services::auth::password::PasswordError;
use crate::services::users::UserError;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden: {reason}")]
    Forbidden { user: String, reason: &'static str },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(user: impl Into<String>, reason: &'static str) -> Self {
        Self::Forbidden {
            user: user.into(),
            reason,
        }
    }
}

/// What went wrong, carried from the handler to the failure middleware.
///
/// `reason` is for the server log only and never reaches the body.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub code: Option<&'static str>,
    pub message: String,
    pub user: Option<String>,
    pub reason: Option<&'static str>,
}

impl ErrorReport {
    fn new(status: StatusCode, code: Option<&'static str>, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            user: None,
            reason: None,
        }
    }

    /// Report for an error response that arrived without one (axum's 405, the body limit's 413).
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, None, status.canonical_reason().unwrap_or("Unknown error"))
    }
}

impl From<AppError> for ErrorReport {
    fn from(e: AppError) -> Self {
        match e {
            AppError::BadRequest { code, message } => {
                ErrorReport::new(StatusCode::BAD_REQUEST, Some(code), message)
            }
            AppError::InvalidCredentials => ErrorReport::new(
                StatusCode::UNAUTHORIZED,
                Some("INVALID_CREDENTIALS"),
                INVALID_CREDENTIALS_MESSAGE,
            ),
            // message is filled in by the unauthenticated responder
            AppError::Unauthenticated => ErrorReport::new(StatusCode::UNAUTHORIZED, None, ""),
            AppError::Forbidden { user, reason } => ErrorReport {
                user: Some(user),
                reason: Some(reason),
                ..ErrorReport::new(StatusCode::FORBIDDEN, None, "")
            },
            AppError::NotFound { resource } => ErrorReport::new(
                StatusCode::NOT_FOUND,
                Some("NOT_FOUND"),
                format!("{resource} not found"),
            ),
            AppError::Conflict { code, message } => {
                ErrorReport::new(StatusCode::CONFLICT, Some(code), message)
            }
            AppError::PayloadTooLarge => ErrorReport::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                Some("PAYLOAD_TOO_LARGE"),
                "request body too large",
            ),
            AppError::Internal => ErrorReport::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("INTERNAL_SERVER_ERROR"),
                "Internal server error",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from(self);
        let mut res = report.status.into_response();
        res.extensions_mut().insert(report);
        res
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("CONFLICT", "resource already exists"),
            RepoError::Db(err) => {
                tracing::error!(error = ?err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::Repo(err) => err.into(),
            AuthError::Token(err) => {
                tracing::error!(error = %err, "token error");
                AppError::Internal
            }
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "auth internal error");
                AppError::Internal
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        tracing::error!(error = %e, "password hashing failed");
        AppError::Internal
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::UsernameTaken => {
                AppError::conflict("USERNAME_TAKEN", "username already in use")
            }
            UserError::NotFound => AppError::not_found("user"),
            UserError::WrongPassword => AppError::InvalidCredentials,
            UserError::SamePassword => AppError::conflict(
                "PASSWORD_UNCHANGED",
                "new password must differ from the current one",
            ),
            UserError::Repo(err) => err.into(),
            UserError::Password(err) => err.into(),
            UserError::Internal(msg) => {
                tracing::error!(error = %msg, "user service internal error");
                AppError::Internal
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::bad_request("INVALID_BODY", e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_carries_report_without_body() {
        let res = AppError::conflict("USERNAME_TAKEN", "taken").into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let report = res.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.code, Some("USERNAME_TAKEN"));
        assert_eq!(report.message, "taken");
    }

    #[test]
    fn forbidden_keeps_reason_out_of_message() {
        let report = ErrorReport::from(AppError::forbidden("a@b.c", "not the owner"));
        assert_eq!(report.status, StatusCode::FORBIDDEN);
        assert_eq!(report.user.as_deref(), Some("a@b.c"));
        assert_eq!(report.reason, Some("not the owner"));
        assert!(!report.message.contains("owner"));
    }

    #[test]
    fn repo_conflict_maps_to_409() {
        let report = ErrorReport::from(AppError::from(RepoError::Conflict));
        assert_eq!(report.status, StatusCode::CONFLICT);
    }

    #[test]
    fn auth_failures_collapse_to_invalid_credentials() {
        let report = ErrorReport::from(AppError::from(AuthError::InvalidCredentials));
        assert_eq!(report.status, StatusCode::UNAUTHORIZED);
        assert_eq!(report.message, INVALID_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn bare_status_report_uses_reason_phrase() {
        let report = ErrorReport::from_status(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(report.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(report.message, "Method Not Allowed");
        assert!(report.code.is_none());
    }
}
