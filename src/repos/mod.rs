/*
 * Responsibility
 * - 永続化層 (UserRepo trait と Postgres / in-memory 実装)
 */
pub mod error;
pub mod memory;
pub mod user_repo;
