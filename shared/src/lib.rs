//! Shared types for the Fazzaain admin console
//!
//! Pure domain types used by the service layer: the order record and its
//! lifecycle, cancellation attribution, catalog/directory/finance models,
//! timestamp normalization and the unified error system. No I/O lives here.

pub mod error;
pub mod models;
pub mod order;
pub mod timestamp;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
pub use timestamp::Timestamp;
