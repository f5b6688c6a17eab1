/*
 * Responsibility
 * - v1 handler 用の extractor を公開する
 */
pub mod auth_ctx;
pub mod user_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use user_id::UserId;
