/*
 * Responsibility
 * - /users 系 handler
 * - AuthCtx で認可 (本人 / ADMIN) → DTO validation → UserService 呼び出し
 * - 登録 (POST /users) だけは公開ルートなので AuthCtx を取らない
 */
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{
    api::v1::dto::users::{
        ChangePasswordRequest, CreateUserRequest, PageQuery, UpdateUserRequest, UserPageResponse,
        UserResponse,
    },
    api::v1::extractors::{AuthCtxExtractor, UserId},
    error::AppError,
    services::auth::Role,
    state::AppState,
};

fn invalid(message: &'static str) -> AppError {
    AppError::bad_request("VALIDATION_FAILED", message)
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate().map_err(invalid)?;

    let row = state.users.register(req.into_registration()).await?;
    let location = format!("/api/v1/users/{}", row.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserResponse::from(row)),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    UserId(user_id): UserId,
) -> Result<Json<UserResponse>, AppError> {
    ctx.require_self_or_admin(user_id)?;

    let row = state.users.get(user_id).await?;
    Ok(Json(row.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    UserId(user_id): UserId,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    ctx.require_self(user_id)?;

    let Json(req) = payload?;
    req.validate().map_err(invalid)?;

    let row = state.users.update_profile(user_id, req.into_update()).await?;
    Ok(Json(row.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    UserId(user_id): UserId,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    ctx.require_self(user_id)?;

    let Json(req) = payload?;
    req.validate().map_err(invalid)?;

    state
        .users
        .change_password(user_id, &req.old_password, &req.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    UserId(user_id): UserId,
) -> Result<StatusCode, AppError> {
    ctx.require_self(user_id)?;

    state.users.deactivate(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<UserPageResponse>, AppError> {
    ctx.require_role(Role::Admin)?;

    let Query(query) = query.map_err(|e| AppError::bad_request("INVALID_QUERY", e.body_text()))?;
    let (page, size) = query.resolve();

    let page = state.users.list(page, size).await?;
    Ok(Json(page.into()))
}
