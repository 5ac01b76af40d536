//! Authentication
//!
//! - [`identity`]: account creation and credential checks
//! - [`session`]: observable signed-in state
//! - [`bootstrap`]: console sign-in gated on an admin record
//! - [`permissions`]: permission catalogue

pub mod bootstrap;
pub mod identity;
pub mod permissions;
pub mod session;

pub use bootstrap::BootstrapService;
pub use identity::{Identity, IdentityProvider, LocalIdentityProvider};
pub use session::{AuthSession, SessionInfo};
