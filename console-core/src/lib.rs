//! Fazzaain admin console core
//!
//! Services behind the operations console, all running over one embedded
//! document store:
//!
//! - **Store** (`store`): redb-backed JSON documents with transactions and
//!   live queries
//! - **Orders** (`orders`): lifecycle, admin overrides, cancellation and
//!   statistics
//! - **Catalog** (`catalog`): main services and sub-services with images
//! - **Directory** (`directory`): admins, providers, provider groups and
//!   customers
//! - **Finance** (`finance`): withdrawal approval and bank settings
//! - **Auth** (`auth`): identity provider, session and bootstrap admin
//!
//! ```text
//! console-core/src/
//! ├── core/          # config, wired state
//! ├── store/         # document store, queries, subscriptions
//! ├── storage/       # object storage for images
//! ├── auth/          # identity, session, permissions
//! ├── orders/        # order service, stats
//! ├── catalog/       # services and sub-services
//! ├── directory/     # admins, providers, groups, customers
//! ├── finance/       # withdrawals, bank settings
//! ├── cities/        # cities and managers
//! ├── complaints/    # customer complaints
//! └── utils/         # logging, in-flight guard
//! ```

pub mod auth;
pub mod catalog;
pub mod cities;
pub mod complaints;
pub mod core;
pub mod directory;
pub mod finance;
pub mod orders;
pub mod storage;
pub mod store;
pub mod utils;

pub use core::{Config, ConsoleState};
pub use store::{DocumentStore, StoreError};
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security events go to the "security" target with level and event fields
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
