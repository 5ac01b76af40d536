//! Staff sign-in with bootstrap provisioning
//!
//! A successful identity sign-in only opens a console session when the
//! account has an admin record. The very first admin (or any configured
//! bootstrap email) is provisioned as `super_admin` on first sign-in.

use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Admin, AdminRole};
use shared::timestamp::Timestamp;

use super::identity::IdentityProvider;
use super::session::{AuthSession, SessionInfo};
use crate::directory::admins::ADMINS;
use crate::security_log;
use crate::store::{Collection, DocumentStore};

pub struct BootstrapService {
    identity: Arc<dyn IdentityProvider>,
    admins: Collection<Admin>,
    session: AuthSession,
    bootstrap_emails: Vec<String>,
}

impl BootstrapService {
    pub fn new(
        store: DocumentStore,
        identity: Arc<dyn IdentityProvider>,
        session: AuthSession,
        bootstrap_emails: Vec<String>,
    ) -> Self {
        Self {
            identity,
            admins: store.collection(ADMINS),
            session,
            bootstrap_emails,
        }
    }

    fn is_bootstrap_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.bootstrap_emails.iter().any(|e| *e == email)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionInfo> {
        let identity = self.identity.sign_in(email, password).await?;

        let admin = match self.admins.get(&identity.account_id)? {
            Some(admin) if !admin.is_active => {
                self.reject(&identity.account_id).await;
                return Err(AppError::new(ErrorCode::AccountDisabled));
            }
            Some(admin) => admin,
            None => {
                let first_admin = self.admins.all()?.is_empty();
                if !first_admin && !self.is_bootstrap_email(&identity.email) {
                    security_log!(
                        "WARN",
                        "sign_in_without_admin_record",
                        account_id = identity.account_id.as_str()
                    );
                    self.reject(&identity.account_id).await;
                    return Err(AppError::permission_denied("Account is not a console admin"));
                }
                self.provision_super_admin(&identity.account_id, &identity.email)?
            }
        };

        let info = SessionInfo::from_admin(&admin);
        self.session.set(info.clone());
        Ok(info)
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(info) = self.session.current() {
            self.identity.sign_out(&info.account_id).await?;
        }
        self.session.clear();
        Ok(())
    }

    async fn reject(&self, account_id: &str) {
        if let Err(e) = self.identity.sign_out(account_id).await {
            tracing::warn!(account_id = %account_id, error = %e, "Sign-out after rejection failed");
        }
        self.session.clear();
    }

    fn provision_super_admin(&self, account_id: &str, email: &str) -> AppResult<Admin> {
        let name = email.split('@').next().unwrap_or(email).to_string();
        let admin = Admin {
            id: account_id.to_string(),
            name,
            email: email.to_string(),
            role: AdminRole::SuperAdmin,
            permissions: Default::default(),
            city_id: None,
            is_active: true,
            created_at: Some(Timestamp::now()),
        };
        self.admins.set(account_id, &admin)?;
        security_log!("INFO", "bootstrap_super_admin", account_id = account_id, email = email);
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::LocalIdentityProvider;

    struct Fixture {
        store: DocumentStore,
        identity: Arc<LocalIdentityProvider>,
        session: AuthSession,
    }

    fn fixture() -> Fixture {
        let store = DocumentStore::open_in_memory().unwrap();
        Fixture {
            identity: Arc::new(LocalIdentityProvider::new(store.clone())),
            session: AuthSession::new(),
            store,
        }
    }

    fn service(f: &Fixture, emails: &[&str]) -> BootstrapService {
        BootstrapService::new(
            f.store.clone(),
            f.identity.clone(),
            f.session.clone(),
            emails.iter().map(|e| e.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn test_first_sign_in_provisions_super_admin() {
        let f = fixture();
        f.identity.create_account("first@x.com", "secret1").await.unwrap();
        let info = service(&f, &[]).sign_in("first@x.com", "secret1").await.unwrap();
        assert_eq!(info.role, AdminRole::SuperAdmin);
        assert!(f.session.is_signed_in());
    }

    #[tokio::test]
    async fn test_unknown_account_denied_once_admins_exist() {
        let f = fixture();
        let svc = service(&f, &["boss@x.com"]);
        f.identity.create_account("first@x.com", "secret1").await.unwrap();
        svc.sign_in("first@x.com", "secret1").await.unwrap();
        svc.sign_out().await.unwrap();

        f.identity.create_account("stranger@x.com", "secret1").await.unwrap();
        let err = svc.sign_in("stranger@x.com", "secret1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(!f.session.is_signed_in());

        f.identity.create_account("boss@x.com", "secret1").await.unwrap();
        let info = svc.sign_in("BOSS@x.com", "secret1").await.unwrap();
        assert_eq!(info.role, AdminRole::SuperAdmin);
    }
}
