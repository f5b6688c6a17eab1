/*
 * Responsibility
 * - POST /auth/login
 * - 資格情報の確認 → token 発行は AuthService::login に任せる
 * - 失敗理由は区別せず 401 "Invalid credentials"
 */
use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    api::v1::dto::auth::{LoginRequest, LoginResponse},
    error::AppError,
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Ok(Json(req)) = payload else {
        tracing::warn!("unreadable login body");
        return Err(AppError::InvalidCredentials);
    };

    if !req.is_complete() {
        return Err(AppError::InvalidCredentials);
    }

    let issued = state.auth.login(&req.username, &req.password).await?;

    Ok(Json(issued.into()))
}
