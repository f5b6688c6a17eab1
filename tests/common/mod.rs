#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use skydiving_logbook::app::{assemble_state, build_router};
use skydiving_logbook::config::{AppEnv, Config, DEFAULT_PUBLIC_ROUTES};
use skydiving_logbook::repos::error::RepoResult;
use skydiving_logbook::repos::memory::MemoryUserRepo;
use skydiving_logbook::repos::user_repo::{NewUser, ProfileUpdate, UserRepo, UserRow};
use skydiving_logbook::services::auth::password::hash_password;
use skydiving_logbook::services::clock::ManualClock;
use skydiving_logbook::state::AppState;

pub const SECRET: &str = "c2t5ZGl2aW5nLWxvZ2Jvb2stdGVzdC1zZWNyZXQta2V5LWE=";
pub const OTHER_SECRET: &str = "c2t5ZGl2aW5nLWxvZ2Jvb2stdGVzdC1zZWNyZXQta2V5LWI=";
pub const PASSWORD: &str = "Freefall#42";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: None,
        app_env: AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        jwt_secret: SECRET.to_string(),
        jwt_expiration_minutes: 60,
        public_routes: DEFAULT_PUBLIC_ROUTES
            .split(',')
            .map(|s| s.trim().to_string())
            .collect(),
        admin_seed: None,
    }
}

/// `MemoryUserRepo` that counts principal lookups by username.
#[derive(Default)]
pub struct CountingRepo {
    inner: MemoryUserRepo,
    pub active_lookups: AtomicUsize,
}

impl CountingRepo {
    pub fn lookups(&self) -> usize {
        self.active_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepo for CountingRepo {
    async fn find_active_by_id(&self, id: i64) -> RepoResult<Option<UserRow>> {
        self.inner.find_active_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        self.inner.find_by_username(username).await
    }

    async fn find_active_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        self.active_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_active_by_username(username).await
    }

    async fn insert(&self, user: NewUser) -> RepoResult<UserRow> {
        self.inner.insert(user).await
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<Option<UserRow>> {
        self.inner.update_profile(id, update).await
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepoResult<bool> {
        self.inner.update_password(id, password_hash).await
    }

    async fn deactivate(&self, id: i64) -> RepoResult<Option<UserRow>> {
        self.inner.deactivate(id).await
    }

    async fn list(&self, limit: i64, offset: i64) -> RepoResult<(Vec<UserRow>, i64)> {
        self.inner.list(limit, offset).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<CountingRepo>,
    pub clock: Arc<ManualClock>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: Config) -> Self {
        let repo = Arc::new(CountingRepo::default());
        let clock = Arc::new(ManualClock::new(start()));
        let state = assemble_state(&config, repo.clone(), clock.clone()).unwrap();
        let router = build_router(state.clone(), &config);
        Self {
            router,
            state,
            repo,
            clock,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    /// Registers through the API and returns the new id.
    pub async fn register(&self, username: &str) -> i64 {
        let res = self
            .call(
                Method::POST,
                "/api/v1/users",
                None,
                Some(json!({"username": username, "password": PASSWORD})),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body["id"].as_i64().unwrap()
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.call(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": username, "password": password})),
        )
        .await
    }

    pub async fn token_for(&self, username: &str) -> String {
        let res = self.login(username, PASSWORD).await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body["token"].as_str().unwrap().to_string()
    }

    /// Inserts an ADMIN straight into the store and logs in.
    pub async fn admin_token(&self, username: &str) -> String {
        self.repo
            .insert(NewUser {
                username: username.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                firstname: None,
                lastname: None,
                role: "ADMIN".to_string(),
            })
            .await
            .unwrap();
        self.token_for(username).await
    }
}
