//! People managed by the console: admins, providers, groups and customers

pub mod admins;
pub mod customers;
pub mod groups;
pub mod providers;

pub use admins::{ADMINS, AdminDirectory};
pub use customers::{CUSTOMERS, CustomerDirectory};
pub use groups::{GROUPS, GroupDirectory};
pub use providers::{PROVIDERS, ProviderDirectory};
