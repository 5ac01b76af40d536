use std::path::PathBuf;

use rust_decimal::Decimal;

/// Console configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Root for the store, images and logs |
/// | STORE_PATH | {WORK_DIR}/console.redb | Document store file |
/// | IMAGES_DIR | {WORK_DIR}/images | Uploaded image root |
/// | PUBLIC_BASE_URL | /images | Prefix of returned image urls |
/// | LOG_LEVEL | info | tracing filter |
/// | LOG_DIR | unset | Daily rolling log directory |
/// | BOOTSTRAP_ADMIN_EMAILS | empty | Comma separated super admin emails |
/// | ENVIRONMENT | development | development, staging or production |
/// | SUBSCRIPTION_CAPACITY | 1024 | Change-event channel capacity |
/// | MIN_WITHDRAWAL_AMOUNT | 50 | Smallest accepted withdrawal |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/fazzaain LOG_LEVEL=debug cargo run -p console-core
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub store_path: PathBuf,
    pub images_dir: PathBuf,
    pub public_base_url: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// Lower-cased emails allowed to self-provision as super admin
    pub bootstrap_admin_emails: Vec<String>,
    /// development | staging | production
    pub environment: String,
    pub subscription_capacity: usize,
    pub min_withdrawal_amount: Decimal,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Split a comma separated email list, trimmed and lower-cased
pub fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from the environment
    ///
    /// A `.env` file in the working directory is honoured when present.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        let work_dir = PathBuf::from(env_or("WORK_DIR", "./data"));
        let store_path = std::env::var("STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_dir.join("console.redb"));
        let images_dir = std::env::var("IMAGES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_dir.join("images"));

        Self {
            store_path,
            images_dir,
            public_base_url: env_or("PUBLIC_BASE_URL", "/images"),
            log_level: env_or("LOG_LEVEL", "info"),
            log_dir: std::env::var("LOG_DIR").ok().map(PathBuf::from),
            bootstrap_admin_emails: parse_email_list(&env_or("BOOTSTRAP_ADMIN_EMAILS", "")),
            environment: env_or("ENVIRONMENT", "development"),
            subscription_capacity: env_parse("SUBSCRIPTION_CAPACITY", 1024),
            min_withdrawal_amount: env_parse("MIN_WITHDRAWAL_AMOUNT", Decimal::from(50)),
            work_dir,
        }
    }

    /// Override the paths to live under `work_dir`
    ///
    /// Used by tests
    pub fn with_overrides(work_dir: impl Into<PathBuf>, bootstrap_emails: &[&str]) -> Self {
        let mut config = Self::from_env();
        let work_dir = work_dir.into();
        config.store_path = work_dir.join("console.redb");
        config.images_dir = work_dir.join("images");
        config.log_dir = None;
        config.bootstrap_admin_emails = bootstrap_emails.iter().map(|e| e.to_lowercase()).collect();
        config.work_dir = work_dir;
        config
    }

    pub fn is_bootstrap_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.bootstrap_admin_emails.iter().any(|e| *e == email)
    }

    /// Whether running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
