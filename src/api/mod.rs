/*
 * Responsibility
 * - API バージョンごとの module を束ねる
 */
pub mod v1;
