/*
 * Responsibility
 * - ユーザーアカウントの業務ロジック (登録 / 参照 / 更新 / パスワード変更 / 論理削除 / 一覧)
 * - username の正規化とパスワードのハッシュ化 (blocking pool 上で実行)
 * - 認可 (本人 / ADMIN) は handler 側で AuthCtx を使って済ませてから呼ぶ
 */
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::AdminSeed;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewUser, ProfileUpdate, UserRepo, UserRow};
use crate::services::auth::Role;
use crate::services::auth::password::{PasswordError, hash_password, verify_password};
use crate::services::auth::principal::normalize_username;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("username already in use")]
    UsernameTaken,
    #[error("user not found")]
    NotFound,
    #[error("current password does not match")]
    WrongPassword,
    #[error("new password must differ from the current one")]
    SamePassword,
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("{0}")]
    Internal(String),
}

impl From<RepoError> for UserError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => UserError::UsernameTaken,
            other => UserError::Repo(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepo>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    /// New accounts always start as SKYDIVER.
    pub async fn register(&self, reg: Registration) -> Result<UserRow, UserError> {
        self.create(reg, Role::Skydiver).await
    }

    pub async fn get(&self, id: i64) -> Result<UserRow, UserError> {
        self.users
            .find_active_by_id(id)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn update_profile(
        &self,
        id: i64,
        mut update: ProfileUpdate,
    ) -> Result<UserRow, UserError> {
        update.username = update.username.as_deref().map(normalize_username);

        let row = self
            .users
            .update_profile(id, update)
            .await?
            .ok_or(UserError::NotFound)?;

        info!(user_id = id, "profile updated");
        Ok(row)
    }

    /// Issued tokens stay valid until they expire; the gate only checks that
    /// the principal is still active.
    pub async fn change_password(
        &self,
        id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let row = self.get(id).await?;

        let stored = row.password_hash.clone();
        let old = old_password.to_string();
        let matches = blocking(move || verify_password(&old, &stored)).await?;
        if !matches {
            warn!(user_id = id, "password change with wrong current password");
            return Err(UserError::WrongPassword);
        }

        if old_password == new_password {
            return Err(UserError::SamePassword);
        }

        let new = new_password.to_string();
        let hash = blocking(move || hash_password(&new)).await??;

        if !self.users.update_password(id, &hash).await? {
            return Err(UserError::NotFound);
        }

        info!(user_id = id, "password changed");
        Ok(())
    }

    /// Soft delete. Deleting an already-inactive user succeeds.
    pub async fn deactivate(&self, id: i64) -> Result<(), UserError> {
        let row = self
            .users
            .deactivate(id)
            .await?
            .ok_or(UserError::NotFound)?;

        info!(user_id = row.id, "user deactivated");
        Ok(())
    }

    /// `page` is zero-based.
    pub async fn list(&self, page: u32, size: u32) -> Result<Page<UserRow>, UserError> {
        let limit = i64::from(size);
        let offset = i64::from(page) * limit;
        let (items, total) = self.users.list(limit, offset).await?;

        Ok(Page {
            items,
            page,
            size,
            total,
        })
    }

    /// Creates the configured ADMIN account unless the username already exists.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<(), UserError> {
        let username = normalize_username(&seed.username);
        if self.users.find_by_username(&username).await?.is_some() {
            info!(%username, "admin account already present");
            return Ok(());
        }

        let row = self
            .create(
                Registration {
                    username,
                    password: seed.password.clone(),
                    firstname: None,
                    lastname: None,
                },
                Role::Admin,
            )
            .await?;

        info!(user_id = row.id, username = %row.username, "admin account created");
        Ok(())
    }

    async fn create(&self, reg: Registration, role: Role) -> Result<UserRow, UserError> {
        let username = normalize_username(&reg.username);
        let password = reg.password;
        let password_hash = blocking(move || hash_password(&password)).await??;

        let row = self
            .users
            .insert(NewUser {
                username,
                password_hash,
                firstname: reg.firstname,
                lastname: reg.lastname,
                role: role.as_str().to_string(),
            })
            .await?;

        info!(user_id = row.id, %role, "user registered");
        Ok(row)
    }
}

async fn blocking<T, F>(f: F) -> Result<T, UserError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| UserError::Internal(format!("password task failed: {e}")))
}
