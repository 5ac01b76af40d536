//! Orders
//!
//! - [`service`]: create, edit, lifecycle moves, listing and live watch
//! - [`stats`]: dashboard totals and cancellation breakdown

pub mod service;
pub mod stats;

pub use service::{CancelOrder, ORDERS, OrderFilter, OrderService, OrderWatch};
pub use stats::{CancellationBreakdown, OrderStats, cancellation_breakdown, order_stats};
