/*
 * Responsibility
 * - middlware の公開インターフェース
 * - 各 module は `apply(router, ...)` を持ち、app.rs から順に掛ける
 */
pub mod auth;
pub mod cors;
pub mod failure;
pub mod http;
pub mod security_headers;
