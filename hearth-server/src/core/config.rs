use chrono_tz::Tz;

use crate::auth::JwtConfig;

/// Server configuration.
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HEARTH_HOST | 0.0.0.0 | Bind address |
/// | HEARTH_HTTP_PORT | 3000 | HTTP port |
/// | HEARTH_DATABASE_PATH | hearth.db | SQLite database file |
/// | HEARTH_TIMEZONE | Europe/Istanbul | Business timezone for order codes and date filters |
/// | HEARTH_CURRENCY | TRY | ISO 4217 code stamped on every order |
/// | HEARTH_REQUEST_TIMEOUT_SECS | 30 | Per-request deadline |
/// | HEARTH_DEFAULT_PREP_MINUTES | 30 | Estimated prep time per sub-order |
/// | HEARTH_DELIVERY_WINDOW_MINUTES | 60 | Estimated delivery window after checkout |
/// | HEARTH_CORS_ORIGIN | (permissive) | Allowed CORS origin |
/// | HEARTH_LOG_LEVEL | info | Log verbosity |
/// | HEARTH_LOG_DIR | (stdout) | Daily-rotated log directory |
/// | ENVIRONMENT | development | development \| staging \| production |
///
/// JWT settings (`HEARTH_JWT_*`) are documented on [`JwtConfig`].
///
/// # Example
///
/// ```ignore
/// HEARTH_DATABASE_PATH=/data/hearth.db HEARTH_HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    /// SQLite database file, created on first start.
    pub database_path: String,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Business timezone. Order codes and date range filters follow
    /// this zone, not UTC.
    pub timezone: Tz,
    pub currency: String,
    /// Requests exceeding this deadline return 504.
    pub request_timeout_secs: u64,
    pub default_prep_minutes: i64,
    pub delivery_window_minutes: i64,
    pub cors_origin: Option<String>,
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HEARTH_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            http_port: std::env::var("HEARTH_HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("HEARTH_DATABASE_PATH")
                .unwrap_or_else(|_| "hearth.db".into()),
            jwt: JwtConfig::default(),
            timezone: std::env::var("HEARTH_TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Europe::Istanbul),
            currency: std::env::var("HEARTH_CURRENCY").unwrap_or_else(|_| "TRY".into()),
            request_timeout_secs: std::env::var("HEARTH_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            default_prep_minutes: std::env::var("HEARTH_DEFAULT_PREP_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            delivery_window_minutes: std::env::var("HEARTH_DELIVERY_WINDOW_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            cors_origin: std::env::var("HEARTH_CORS_ORIGIN").ok(),
            log_dir: std::env::var("HEARTH_LOG_DIR").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the parts tests care about.
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
