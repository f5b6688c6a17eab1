/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware (Request Gate) が検証して request extensions に格納し、handler はこの型だけを受け取る
 * - role / 所有者チェックはここで AppError::Forbidden に変換する
 *
 * Notes
 * - token の検証や principal の解決は middleware/services 側の責務
 * - 1 リクエストの間だけ生きる。永続化も共有もしない
 */

use crate::error::AppError;
use crate::services::auth::{Principal, Role};

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `principal` は Request Gate がその場で解決したもの (active 確認済み)
/// - `authorities` は role から導出 (`ROLE_SKYDIVER` など)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub principal: Principal,
    pub authorities: Vec<String>,
}

impl AuthCtx {
    pub fn new(principal: Principal) -> Self {
        let authorities = vec![principal.role.authority()];
        Self {
            principal,
            authorities,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.principal.id
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn is_admin(&self) -> bool {
        self.has_authority(&Role::Admin.authority())
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.has_authority(&role.authority()) {
            Ok(())
        } else {
            Err(AppError::forbidden(self.username(), "missing required role"))
        }
    }

    /// Owner only. Admins get no bypass here.
    pub fn require_self(&self, user_id: i64) -> Result<(), AppError> {
        if self.user_id() == user_id {
            Ok(())
        } else {
            Err(AppError::forbidden(self.username(), "not the resource owner"))
        }
    }

    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.user_id() == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden(
                self.username(),
                "neither the resource owner nor an admin",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(id: i64, role: Role) -> AuthCtx {
        AuthCtx::new(Principal {
            id,
            username: format!("user{id}@example.com"),
            role,
            active: true,
        })
    }

    #[test]
    fn authorities_follow_role() {
        assert_eq!(ctx(1, Role::Skydiver).authorities, vec!["ROLE_SKYDIVER"]);
        assert!(ctx(1, Role::Admin).is_admin());
    }

    #[test]
    fn admin_route_rejects_skydiver() {
        assert!(ctx(1, Role::Admin).require_role(Role::Admin).is_ok());
        assert!(matches!(
            ctx(1, Role::Skydiver).require_role(Role::Admin),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn ownership_checks() {
        let skydiver = ctx(1, Role::Skydiver);
        assert!(skydiver.require_self(1).is_ok());
        assert!(skydiver.require_self(2).is_err());
        assert!(skydiver.require_self_or_admin(2).is_err());

        let admin = ctx(9, Role::Admin);
        assert!(admin.require_self_or_admin(2).is_ok());
        assert!(admin.require_self(2).is_err());
    }
}
