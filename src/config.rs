/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、JWT 設定、公開ルートなど)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::jwt::MAX_TTL_MINUTES;

pub const DEFAULT_PUBLIC_ROUTES: &str =
    "/health,/api/v1/auth/**,POST /api/v1/users,/swagger-ui/**";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Credentials for an ADMIN account created at startup if it does not exist yet.
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    // None -> in-memory store
    pub database_url: Option<String>,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Base64 (standard alphabet), at least 32 bytes once decoded
    pub jwt_secret: String,
    pub jwt_expiration_minutes: u64,

    // `[METHOD ]pattern`, a trailing `/**` matches the whole subtree
    pub public_routes: Vec<String>,

    pub admin_seed: Option<AdminSeed>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing secret or the database credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("database", &self.database_url.is_some())
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("public_routes", &self.public_routes)
            .field("admin_seed", &self.admin_seed)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key -> value source (`from_env` passes the process env).
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match var("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = var("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let cors_allowed_origins = split_list(&var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let jwt_secret = var("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration_minutes = match var("JWT_EXPIRATION_MINUTES") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|m| (1..=MAX_TTL_MINUTES).contains(m))
                .ok_or(ConfigError::Invalid("JWT_EXPIRATION_MINUTES"))?,
            None => 60,
        };

        let public_routes = split_list(
            &var("PUBLIC_ROUTES").unwrap_or_else(|| DEFAULT_PUBLIC_ROUTES.to_string()),
        );

        let admin_seed = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.trim().is_empty() => Some(AdminSeed {
                username,
                password,
            }),
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            _ => None,
        };

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            jwt_expiration_minutes,
            public_routes,
            admin_seed,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
