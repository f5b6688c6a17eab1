/*
 * Responsibility
 * - users テーブル向けの操作 (UserRepo trait)
 * - PgUserRepo: SQLx 実装 / MemoryUserRepo: DATABASE_URL 無しの開発・テスト用
 * - 一意制約違反は RepoError::Conflict に寄せる
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub uuid: Uuid,
    pub username: String,
    pub password_hash: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: String,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// Storage for user accounts.
///
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait UserRepo: Send + Sync + 'static {
    async fn find_active_by_id(&self, id: i64) -> RepoResult<Option<UserRow>>;

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>>;

    async fn find_active_by_username(&self, username: &str) -> RepoResult<Option<UserRow>>;

    // Err(Conflict) when the username is already taken (active or not).
    async fn insert(&self, user: NewUser) -> RepoResult<UserRow>;

    // Active users only. Err(Conflict) when the new username belongs to someone else.
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<Option<UserRow>>;

    // Active users only. Returns whether a row changed.
    async fn update_password(&self, id: i64, password_hash: &str) -> RepoResult<bool>;

    // Sets active = false. Already-inactive rows are returned unchanged.
    async fn deactivate(&self, id: i64) -> RepoResult<Option<UserRow>>;

    // One page ordered by id, plus the total row count.
    async fn list(&self, limit: i64, offset: i64) -> RepoResult<(Vec<UserRow>, i64)>;
}

const USER_COLUMNS: &str = r#"id, uuid, username, password_hash, firstname, lastname, role, active, created_at, updated_at"#;

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_active_by_id(&self, id: i64) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND active"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_active_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND active"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(&self, user: NewUser) -> RepoResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (uuid, username, password_hash, firstname, lastname, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                firstname = COALESCE($3, firstname),
                lastname = COALESCE($4, lastname),
                updated_at = now()
            WHERE id = $1 AND active
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.username)
        .bind(&update.firstname)
        .bind(&update.lastname)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = now()
            WHERE id = $1 AND active
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, id: i64) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET
                updated_at = CASE WHEN active THEN now() ELSE updated_at END,
                active = false
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self, limit: i64, offset: i64) -> RepoResult<(Vec<UserRow>, i64)> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }
}
