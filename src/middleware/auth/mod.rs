/*
 * Responsibility
 * - 認証まわりの middleware (Request Gate と公開ルート判定)
 */
pub mod access;
pub mod public_routes;

pub use public_routes::PublicRoutes;
