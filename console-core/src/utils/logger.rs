//! Logging Infrastructure
//!
//! Structured logging for development and production. Security events use
//! `target: "security"` (see [`crate::security_log`]).

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger at `info`, stdout only
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional daily rolling file output
///
/// `RUST_LOG` wins over `log_level` when set. Calling this twice is a no-op.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&Path>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && (dir.exists() || std::fs::create_dir_all(dir).is_ok())
    {
        let file_appender = tracing_appender::rolling::daily(dir, "console-core");
        let _ = subscriber.with_writer(file_appender).try_init();
        return;
    }

    let _ = subscriber.try_init();
}
