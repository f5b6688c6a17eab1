/*
 * Responsibility
 * - 業務ロジック層 (認証・ユーザー管理・時刻)
 */
pub mod auth;
pub mod clock;
pub mod users;
