//! Service catalog

pub mod service;

pub use service::{CatalogService, Confirmation, ImageUpload, MAIN_SERVICES};
