//! Identity provider
//!
//! Account creation is isolated from the signed-in staff session: creating
//! an account for another admin never signs anyone in or out.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::timestamp::{self, Timestamp};

use crate::security_log;
use crate::store::{Collection, DocumentStore, Query};

pub const ACCOUNTS: &str = "accounts";

/// Failed sign-ins allowed within [`LOCKOUT_WINDOW`]
pub const MAX_FAILED_ATTEMPTS: usize = 5;
pub const LOCKOUT_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: String,
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account without touching the current session
    async fn create_account(&self, email: &str, password: &str) -> AppResult<String>;

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;

    async fn sign_out(&self, account_id: &str) -> AppResult<()>;

    async fn delete_account(&self, account_id: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    #[serde(default)]
    id: String,
    email: String,
    password_hash: String,
    #[serde(default)]
    disabled: bool,
    #[serde(default, with = "timestamp::lenient")]
    created_at: Option<Timestamp>,
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Identity provider storing argon2 hashes in the `accounts` collection
pub struct LocalIdentityProvider {
    accounts: Collection<Account>,
    failures: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl LocalIdentityProvider {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            accounts: store.collection(ACCOUNTS),
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let found = self.accounts.query(&Query::new().eq("email", email).limit(1))?;
        Ok(found.into_iter().next())
    }

    fn is_locked(&self, email: &str) -> bool {
        let mut failures = self.failures.lock();
        let Some(window) = failures.get_mut(email) else {
            return false;
        };
        let now = Instant::now();
        while window.front().is_some_and(|t| now.duration_since(*t) > LOCKOUT_WINDOW) {
            window.pop_front();
        }
        window.len() >= MAX_FAILED_ATTEMPTS
    }

    fn record_failure(&self, email: &str) {
        self.failures
            .lock()
            .entry(email.to_string())
            .or_default()
            .push_back(Instant::now());
    }

    fn clear_failures(&self, email: &str) {
        self.failures.lock().remove(email);
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(AppError::validation(format!("Invalid email: {}", email)));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::new(ErrorCode::PasswordTooShort));
        }
        if self.find_by_email(&email)?.is_some() {
            return Err(AppError::email_in_use(&email));
        }

        let password_hash = hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;
        let id = self.accounts.insert(&Account {
            id: String::new(),
            email: email.clone(),
            password_hash,
            disabled: false,
            created_at: Some(Timestamp::now()),
        })?;

        tracing::info!(account_id = %id, email = %email, "Account created");
        Ok(id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let email = normalize_email(email);
        if self.is_locked(&email) {
            security_log!("WARN", "sign_in_rate_limited", email = email.as_str());
            return Err(AppError::new(ErrorCode::RateLimited));
        }

        let account = match self.find_by_email(&email)? {
            Some(account) if verify_password(password, &account.password_hash) => account,
            _ => {
                self.record_failure(&email);
                security_log!("WARN", "sign_in_failed", email = email.as_str());
                return Err(AppError::invalid_credentials());
            }
        };
        if account.disabled {
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }

        self.clear_failures(&email);
        Ok(Identity {
            account_id: account.id,
            email: account.email,
        })
    }

    async fn sign_out(&self, account_id: &str) -> AppResult<()> {
        tracing::debug!(account_id = %account_id, "Signed out");
        Ok(())
    }

    async fn delete_account(&self, account_id: &str) -> AppResult<()> {
        if !self.accounts.delete(account_id)? {
            return Err(AppError::not_found(format!("Account {}", account_id)));
        }
        tracing::info!(account_id = %account_id, "Account deleted");
        Ok(())
    }
}
