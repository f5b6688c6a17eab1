/*
 * Responsibility
 * - v1 の URL 構造を定義 (/api/v1 に nest される)
 * - 認証の要不要は route ではなく Request Gate + 公開ルート設定で決める
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::login,
    users::{change_password, create_user, delete_user, get_user, list_users, update_user},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/users", post(create_user))
        .route("/users/all", get(list_users))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{user_id}/password", put(change_password))
}
