//! Skydiving logbook REST service: user accounts guarded by stateless JWT auth.
//!
//! The binary only calls [`app::run`]; everything else is exposed so the
//! router can be driven in-process from `tests/`.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
