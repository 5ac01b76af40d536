//! Console state: every service wired over one store

use std::sync::Arc;

use shared::error::{AppError, AppResult};

use crate::auth::{AuthSession, BootstrapService, IdentityProvider, LocalIdentityProvider};
use crate::catalog::CatalogService;
use crate::cities::CityService;
use crate::complaints::ComplaintService;
use crate::core::Config;
use crate::directory::{AdminDirectory, CustomerDirectory, GroupDirectory, ProviderDirectory};
use crate::finance::{BankSettingsService, WithdrawalService};
use crate::orders::OrderService;
use crate::storage::{FsObjectStore, ObjectStore};
use crate::store::DocumentStore;
use crate::utils::InFlightGuard;

/// Shared handles to the store and all services
///
/// Cloning is cheap; services share the store, the session and the
/// in-flight guard.
#[derive(Clone)]
pub struct ConsoleState {
    pub config: Config,
    pub store: DocumentStore,
    pub session: AuthSession,
    pub guard: InFlightGuard,
    pub images: Arc<dyn ObjectStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub bootstrap: Arc<BootstrapService>,
    pub admins: Arc<AdminDirectory>,
    pub providers: ProviderDirectory,
    pub groups: GroupDirectory,
    pub customers: CustomerDirectory,
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub withdrawals: WithdrawalService,
    pub bank_settings: BankSettingsService,
    pub cities: CityService,
    pub complaints: ComplaintService,
}

impl ConsoleState {
    /// Open the store under `config` and build every service
    pub fn initialize(config: &Config) -> AppResult<Self> {
        for dir in [&config.work_dir, &config.images_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::internal(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        let store = DocumentStore::open_with_capacity(&config.store_path, config.subscription_capacity)?;
        tracing::info!(path = %config.store_path.display(), "Document store opened");

        let images: Arc<dyn ObjectStore> =
            Arc::new(FsObjectStore::new(config.images_dir.clone(), config.public_base_url.clone()));
        Ok(Self::with_store(config.clone(), store, images))
    }

    /// Build services over an already opened store
    pub fn with_store(config: Config, store: DocumentStore, images: Arc<dyn ObjectStore>) -> Self {
        let session = AuthSession::new();
        let guard = InFlightGuard::new();
        let identity: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(store.clone()));

        Self {
            bootstrap: Arc::new(BootstrapService::new(
                store.clone(),
                identity.clone(),
                session.clone(),
                config.bootstrap_admin_emails.clone(),
            )),
            admins: Arc::new(AdminDirectory::new(store.clone(), identity.clone())),
            providers: ProviderDirectory::new(store.clone()),
            groups: GroupDirectory::new(store.clone(), guard.clone()),
            customers: CustomerDirectory::new(store.clone()),
            orders: OrderService::new(store.clone(), guard.clone()),
            catalog: CatalogService::new(store.clone(), images.clone(), guard.clone()),
            withdrawals: WithdrawalService::new(store.clone(), guard.clone(), config.min_withdrawal_amount),
            bank_settings: BankSettingsService::new(store.clone()),
            cities: CityService::new(store.clone()),
            complaints: ComplaintService::new(store.clone()),
            config,
            store,
            session,
            guard,
            images,
            identity,
        }
    }
}
