use std::sync::Arc;

use tracing::error;

use crate::repos::error::RepoResult;
use crate::repos::user_repo::{UserRepo, UserRow};
use crate::services::auth::principal::{Principal, Role, normalize_username};

/// A principal together with its stored password hash. Only the credential
/// verifier ever sees this.
#[derive(Debug, Clone)]
pub struct Account {
    pub principal: Principal,
    pub password_hash: String,
}

/// Sole source of principals for login and for per-request verification.
///
/// Usernames are normalized and inactive users are invisible, so a user
/// deactivated mid-session is "not found" the next time a request resolves it.
#[derive(Clone)]
pub struct PrincipalDirectory {
    users: Arc<dyn UserRepo>,
}

impl std::fmt::Debug for PrincipalDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalDirectory").finish_non_exhaustive()
    }
}

impl PrincipalDirectory {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    pub async fn find_active_by_username(&self, username: &str) -> RepoResult<Option<Principal>> {
        Ok(self.find_active_account(username).await?.map(|a| a.principal))
    }

    pub(crate) async fn find_active_account(&self, username: &str) -> RepoResult<Option<Account>> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Ok(None);
        }

        let row = self.users.find_active_by_username(&username).await?;
        Ok(row.and_then(account_from_row))
    }
}

fn account_from_row(row: UserRow) -> Option<Account> {
    // Fail closed on a role we do not understand.
    let role = match row.role.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            error!(user_id = row.id, error = %e, "user row carries an unknown role");
            return None;
        }
    };

    Some(Account {
        principal: Principal {
            id: row.id,
            username: row.username,
            role,
            active: row.active,
        },
        password_hash: row.password_hash,
    })
}
