/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: token codec + principal directory + credential verifier
 *   - users: アカウント管理
 *   - public_routes: Request Gate が token を見ないルート
 * - Clone 前提で持つ (内部は Arc で cheap)
 */
use std::sync::Arc;

use crate::middleware::auth::PublicRoutes;
use crate::services::{auth::AuthService, users::UserService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub public_routes: Arc<PublicRoutes>,
}

impl AppState {
    pub fn new(
        auth: Arc<AuthService>,
        users: Arc<UserService>,
        public_routes: Arc<PublicRoutes>,
    ) -> Self {
        Self {
            auth,
            users,
            public_routes,
        }
    }
}
