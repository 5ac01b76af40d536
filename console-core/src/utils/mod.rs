//! Utilities
//!
//! - [`logger`]: tracing subscriber setup
//! - [`inflight`]: per-document mutation guard

pub mod inflight;
pub mod logger;

pub use inflight::{InFlightGuard, InFlightTicket};
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
