//! Data models
//!
//! Stored as camelCase JSON documents. Ids are store-assigned strings.

pub mod admin;
pub mod catalog;
pub mod city;
pub mod customer;
pub mod group;
pub mod provider;
pub mod withdrawal;

// Re-exports
pub use admin::*;
pub use catalog::*;
pub use city::*;
pub use customer::*;
pub use group::*;
pub use provider::*;
pub use withdrawal::*;
