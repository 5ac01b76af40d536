//! Unified error system
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::InsufficientBalance)
//!     .with_detail("provider_id", "p-1");
//! assert_eq!(err.code, ErrorCode::InsufficientBalance);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
