//! In-process `UserRepo` used when no database is configured, and by tests.
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{NewUser, ProfileUpdate, UserRepo, UserRow};

#[derive(Debug, Default)]
pub struct MemoryUserRepo {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    // Ordered by id (ids are only ever appended).
    rows: Vec<UserRow>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn get_mut(&mut self, id: i64) -> Option<&mut UserRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_active_by_id(&self, id: i64) -> RepoResult<Option<UserRow>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|r| r.id == id && r.active).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|r| r.username == username).cloned())
    }

    async fn find_active_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .find(|r| r.username == username && r.active)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> RepoResult<UserRow> {
        let mut inner = self.inner.write().await;
        if inner.rows.iter().any(|r| r.username == user.username) {
            return Err(RepoError::Conflict);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let row = UserRow {
            id: inner.next_id,
            uuid: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            firstname: user.firstname,
            lastname: user.lastname,
            role: user.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(row.clone());

        Ok(row)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<Option<UserRow>> {
        let mut inner = self.inner.write().await;

        if let Some(name) = &update.username
            && inner.rows.iter().any(|r| r.id != id && &r.username == name)
        {
            return Err(RepoError::Conflict);
        }

        let Some(row) = inner.get_mut(id).filter(|r| r.active) else {
            return Ok(None);
        };

        if let Some(username) = update.username {
            row.username = username;
        }
        if let Some(firstname) = update.firstname {
            row.firstname = Some(firstname);
        }
        if let Some(lastname) = update.lastname {
            row.lastname = Some(lastname);
        }
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepoResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.get_mut(id).filter(|r| r.active) {
            Some(row) => {
                row.password_hash = password_hash.to_string();
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate(&self, id: i64) -> RepoResult<Option<UserRow>> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.get_mut(id) else {
            return Ok(None);
        };
        if row.active {
            row.active = false;
            row.updated_at = Utc::now();
        }
        Ok(Some(row.clone()))
    }

    async fn list(&self, limit: i64, offset: i64) -> RepoResult<(Vec<UserRow>, i64)> {
        let inner = self.inner.read().await;
        let page: Vec<UserRow> = inner
            .rows
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, inner.rows.len() as i64))
    }
}
