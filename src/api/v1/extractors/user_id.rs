/*
 * Responsibility
 * - Path の `{user_id}` を内部 ID (i64) として受ける
 * - 失敗時は axum 既定の text ではなく AppError (400) に変換する
 */
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_ID", "user id must be a positive integer"))?;

        if id <= 0 {
            return Err(AppError::bad_request(
                "INVALID_ID",
                "user id must be a positive integer",
            ));
        }
        Ok(Self(id))
    }
}
