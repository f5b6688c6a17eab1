/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (Request Gate / error body / security headers / CORS / HTTP)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{Config, ConfigError};
use crate::error::AppError;
use crate::middleware::{self, auth::PublicRoutes};
use crate::repos::memory::MemoryUserRepo;
use crate::repos::user_repo::{PgUserRepo, UserRepo};
use crate::services::auth::build_auth_service;
use crate::services::clock::{Clock, SystemClock};
use crate::services::users::UserService;
use crate::state::AppState;

const DB_MAX_CONNECTIONS: u32 = 10;

fn init_tracing() {
    // RUST_LOG 優先。無ければ既定値
    // Ex:
    // RUST_LOG=info,skydiving_logbook=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr が見えない起動方法でも panic を落とさない
        tracing::error!(?info, "panic");

        // development: 即死させて気付く / production: 既定動作のまま稼働を続ける
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting skydiving logbook in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "configuration loaded");

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let users: Arc<dyn UserRepo> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(DB_MAX_CONNECTIONS)
                .connect(url)
                .await
                .context("failed to connect to Postgres")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;
            tracing::info!("using Postgres user store");
            Arc::new(PgUserRepo::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts live in memory only");
            Arc::new(MemoryUserRepo::new())
        }
    };

    let state = assemble_state(config, users, Arc::new(SystemClock))?;

    if let Some(seed) = &config.admin_seed {
        state
            .users
            .seed_admin(seed)
            .await
            .map_err(|e| anyhow::anyhow!("failed to seed admin account: {e}"))?;
    }

    Ok(state)
}

/// Wires services around an already-chosen user store and time source.
pub fn assemble_state(
    config: &Config,
    users: Arc<dyn UserRepo>,
    clock: Arc<dyn Clock>,
) -> Result<AppState, ConfigError> {
    let auth = build_auth_service(config, users.clone(), clock)?;
    let public_routes = PublicRoutes::parse(&config.public_routes)?;

    Ok(AppState::new(
        auth,
        Arc::new(UserService::new(users)),
        Arc::new(public_routes),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .fallback(|| async { AppError::not_found("resource") });

    let router = middleware::auth::access::apply(router, state.clone()).with_state(state);

    // 内側から: security headers → CORS → request id / trace / limit / timeout → error body
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    let router = middleware::http::apply(router);
    middleware::failure::apply(router)
}
