//! Order lifecycle model
//!
//! - [`types`]: the order record, history log and payloads
//! - [`wire`]: normalization of every stored order shape
//! - [`lifecycle`]: the status state machine
//! - [`classifier`]: pure cancellation attribution

pub mod classifier;
pub mod lifecycle;
pub mod types;
pub mod wire;

pub use classifier::{LifecycleCategory, SearchFailure, classify, was_ever_accepted};
pub use lifecycle::{TransitionError, cancellation_target, validate_transition};
pub use types::*;
