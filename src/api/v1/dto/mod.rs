/*
 * Responsibility
 * - v1 の request/response DTO と形式チェック (validate)
 */
pub mod auth;
pub mod users;
