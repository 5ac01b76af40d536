//! Admin directory
//!
//! Admin records are keyed by their identity account id. Creating an admin
//! goes through the identity provider's isolated account creation, so the
//! staff member doing it stays signed in as themselves.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Admin, AdminCreate, AdminRole, AdminUpdate};
use shared::timestamp::Timestamp;

use crate::auth::IdentityProvider;
use crate::auth::permissions;
use crate::security_log;
use crate::store::{Collection, DocumentStore};

pub const ADMINS: &str = "admins";

fn admin_not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::AdminNotFound, id)
}

/// Keep only catalogue permissions; a super admin stores none
fn sanitize_permissions(role: AdminRole, requested: BTreeSet<String>) -> AppResult<BTreeSet<String>> {
    if role.is_super() {
        return Ok(BTreeSet::new());
    }
    if let Some(unknown) = requested.iter().find(|p| !permissions::is_known_permission(p)) {
        return Err(AppError::validation(format!("Unknown permission: {}", unknown)));
    }
    Ok(requested)
}

pub struct AdminDirectory {
    admins: Collection<Admin>,
    identity: Arc<dyn IdentityProvider>,
}

impl AdminDirectory {
    pub fn new(store: DocumentStore, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            admins: store.collection(ADMINS),
            identity,
        }
    }

    pub fn get_admin(&self, id: &str) -> AppResult<Admin> {
        self.admins.get(id)?.ok_or_else(|| admin_not_found(id))
    }

    pub fn list_admins(&self) -> AppResult<Vec<Admin>> {
        let mut admins = self.admins.all()?;
        admins.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(admins)
    }

    pub fn effective_permissions(&self, id: &str) -> AppResult<BTreeSet<String>> {
        Ok(permissions::effective_permissions(&self.get_admin(id)?))
    }

    pub fn has_permission(&self, id: &str, permission: &str) -> AppResult<bool> {
        Ok(permissions::has_permission(&self.get_admin(id)?, permission))
    }

    pub async fn create_admin(&self, data: AdminCreate) -> AppResult<Admin> {
        if data.name.trim().is_empty() {
            return Err(AppError::validation("name is required"));
        }
        let permissions = sanitize_permissions(data.role, data.permissions)?;
        let account_id = self.identity.create_account(&data.email, &data.password).await?;

        let admin = Admin {
            id: account_id.clone(),
            name: data.name.trim().to_string(),
            email: data.email.trim().to_lowercase(),
            role: data.role,
            permissions,
            city_id: None,
            is_active: true,
            created_at: Some(Timestamp::now()),
        };
        if let Err(e) = self.admins.set(&account_id, &admin) {
            tracing::error!(account_id = %account_id, error = %e, "Admin record write failed, removing account");
            if let Err(cleanup) = self.identity.delete_account(&account_id).await {
                tracing::error!(account_id = %account_id, error = %cleanup, "Orphaned identity account");
            }
            return Err(e.into());
        }

        security_log!(
            "INFO",
            "admin_created",
            account_id = account_id.as_str(),
            role = if admin.role.is_super() { "super_admin" } else { "admin" }
        );
        Ok(admin)
    }

    pub fn update_admin(&self, id: &str, data: AdminUpdate) -> AppResult<Admin> {
        let current = self.get_admin(id)?;
        let role = data.role.unwrap_or(current.role);
        if current.role.is_super() && !role.is_super() {
            self.ensure_other_super_admin(id)?;
        }

        let mut patch = serde_json::Map::new();
        if let Some(name) = data.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name is required"));
            }
            patch.insert("name".into(), json!(name.trim()));
        }
        if data.role.is_some() {
            patch.insert(
                "role".into(),
                serde_json::to_value(role).map_err(|e| AppError::internal(e.to_string()))?,
            );
        }
        if data.permissions.is_some() || role.is_super() {
            let requested = data.permissions.unwrap_or(current.permissions);
            patch.insert("permissions".into(), json!(sanitize_permissions(role, requested)?));
        }
        if let Some(active) = data.is_active {
            if !active && current.role.is_super() {
                self.ensure_other_super_admin(id)?;
            }
            patch.insert("isActive".into(), json!(active));
        }

        self.admins.update(id, Value::Object(patch))?;
        tracing::info!(admin_id = %id, "Admin updated");
        self.get_admin(id)
    }

    pub async fn delete_admin(&self, id: &str) -> AppResult<()> {
        let admin = self.get_admin(id)?;
        if admin.role.is_super() {
            self.ensure_other_super_admin(id)?;
        }
        self.admins.delete(id)?;
        if let Err(e) = self.identity.delete_account(id).await {
            tracing::warn!(admin_id = %id, error = %e, "Admin removed but identity account remains");
        }
        security_log!("INFO", "admin_deleted", account_id = id);
        Ok(())
    }

    fn ensure_other_super_admin(&self, id: &str) -> AppResult<()> {
        let others = self
            .admins
            .all()?
            .into_iter()
            .filter(|a| a.id != id && a.role.is_super() && a.is_active)
            .count();
        if others == 0 {
            return Err(AppError::new(ErrorCode::CannotDeleteLastSuperAdmin));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthSession, BootstrapService, LocalIdentityProvider};

    fn setup() -> (DocumentStore, Arc<LocalIdentityProvider>, AdminDirectory) {
        let store = DocumentStore::open_in_memory().unwrap();
        let identity = Arc::new(LocalIdentityProvider::new(store.clone()));
        let dir = AdminDirectory::new(store.clone(), identity.clone());
        (store, identity, dir)
    }

    fn create(email: &str, role: AdminRole, perms: &[&str]) -> AdminCreate {
        AdminCreate {
            name: "Staff".into(),
            email: email.into(),
            password: "secret1".into(),
            role,
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_admin_leaves_session_untouched() {
        let (store, identity, dir) = setup();
        let session = AuthSession::new();
        let bootstrap = BootstrapService::new(store, identity, session.clone(), vec![]);

        dir.create_admin(create("boss@x.com", AdminRole::SuperAdmin, &[]))
            .await
            .unwrap();
        let me = bootstrap.sign_in("boss@x.com", "secret1").await.unwrap();

        let created = dir
            .create_admin(create("clerk@x.com", AdminRole::Admin, &[permissions::ORDERS_VIEW]))
            .await
            .unwrap();
        assert_eq!(session.current().unwrap().account_id, me.account_id);
        assert_ne!(created.id, me.account_id);
    }

    #[tokio::test]
    async fn test_super_admin_permissions_ignored() {
        let (_store, _identity, dir) = setup();
        let admin = dir
            .create_admin(create("s@x.com", AdminRole::SuperAdmin, &[permissions::ORDERS_VIEW]))
            .await
            .unwrap();
        assert!(admin.permissions.is_empty());
        assert!(dir.has_permission(&admin.id, permissions::FINANCE_APPROVE).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_surfaces_distinct_code() {
        let (_store, _identity, dir) = setup();
        dir.create_admin(create("a@x.com", AdminRole::Admin, &[])).await.unwrap();
        let err = dir
            .create_admin(create("a@x.com", AdminRole::Admin, &[]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyInUse);
    }

    #[tokio::test]
    async fn test_unknown_permission_rejected() {
        let (_store, _identity, dir) = setup();
        let err = dir
            .create_admin(create("a@x.com", AdminRole::Admin, &["root"]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_last_super_admin_protected() {
        let (_store, _identity, dir) = setup();
        let boss = dir
            .create_admin(create("boss@x.com", AdminRole::SuperAdmin, &[]))
            .await
            .unwrap();
        let err = dir.delete_admin(&boss.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotDeleteLastSuperAdmin);

        let demote = AdminUpdate {
            role: Some(AdminRole::Admin),
            ..Default::default()
        };
        assert_eq!(
            dir.update_admin(&boss.id, demote).unwrap_err().code,
            ErrorCode::CannotDeleteLastSuperAdmin
        );

        let clerk = dir
            .create_admin(create("clerk@x.com", AdminRole::Admin, &[]))
            .await
            .unwrap();
        dir.delete_admin(&clerk.id).await.unwrap();
        assert_eq!(dir.get_admin(&clerk.id).unwrap_err().code, ErrorCode::AdminNotFound);
    }
}
