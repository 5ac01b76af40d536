//! Configuration and the wired console state

pub mod config;
pub mod state;

pub use config::Config;
pub use state::ConsoleState;
