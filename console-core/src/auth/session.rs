//! Observable auth session
//!
//! Holds the signed-in staff member. Observers get change notifications via
//! [`AuthSession::subscribe`].

use std::collections::BTreeSet;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Admin, AdminRole};
use tokio::sync::watch;

use super::permissions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub account_id: String,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub permissions: BTreeSet<String>,
}

impl SessionInfo {
    pub fn from_admin(admin: &Admin) -> Self {
        Self {
            account_id: admin.id.clone(),
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
            permissions: permissions::effective_permissions(admin),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.role.is_super() || self.permissions.contains(permission)
    }
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    tx: watch::Sender<Option<SessionInfo>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<SessionInfo> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub(crate) fn set(&self, info: SessionInfo) {
        tracing::info!(account_id = %info.account_id, role = ?info.role, "Session started");
        self.tx.send_replace(Some(info));
    }

    pub(crate) fn clear(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("Session ended");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionInfo>> {
        self.tx.subscribe()
    }

    pub fn require(&self) -> AppResult<SessionInfo> {
        self.current().ok_or_else(AppError::not_authenticated)
    }

    pub fn require_permission(&self, permission: &str) -> AppResult<SessionInfo> {
        let info = self.require()?;
        if info.has_permission(permission) {
            Ok(info)
        } else {
            Err(AppError::with_message(
                ErrorCode::PermissionDenied,
                format!("Missing permission: {}", permission),
            ))
        }
    }

    pub fn require_super_admin(&self) -> AppResult<SessionInfo> {
        let info = self.require()?;
        if info.role.is_super() {
            Ok(info)
        } else {
            Err(AppError::new(ErrorCode::SuperAdminRequired))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(role: AdminRole) -> SessionInfo {
        SessionInfo {
            account_id: "a1".into(),
            email: "a@x.com".into(),
            name: "A".into(),
            role,
            permissions: [permissions::ORDERS_VIEW.to_string()].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let session = AuthSession::new();
        let mut rx = session.subscribe();
        assert!(rx.borrow().is_none());

        session.set(info(AdminRole::Admin));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|i| i.account_id.clone()), Some("a1".into()));

        session.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_require_permission() {
        let session = AuthSession::new();
        assert_eq!(session.require().unwrap_err().code, ErrorCode::NotAuthenticated);

        session.set(info(AdminRole::Admin));
        assert!(session.require_permission(permissions::ORDERS_VIEW).is_ok());
        assert_eq!(
            session.require_permission(permissions::FINANCE_APPROVE).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        assert_eq!(session.require_super_admin().unwrap_err().code, ErrorCode::SuperAdminRequired);
    }
}
