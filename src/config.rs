//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const CI_API_BASE_URL: &str = "https://api.travis-ci.com";
    pub const CI_REPO_SLUG: &str = "ray-project/ray";
    pub const CI_BRANCH: &str = "master";
    pub const CI_EVENT_TYPE: &str = "push";
    pub const JOBS_PER_BUILD: usize = 4; // Job slots tracked per build
    pub const WINDOW_SIZE: usize = 10; // Builds per dashboard query
    pub const MAX_WINDOW_SIZE: usize = 100;
    pub const INGEST_LIMIT: usize = 25; // Builds fetched per ingestion batch
    pub const INGEST_INTERVAL_SECS: u64 = 900; // 15 min
    pub const RETENTION_SECS: u64 = 7 * 24 * 3600; // One week
    pub const MAX_RETENTION_SECS: u64 = 365 * 24 * 3600; // One year
    pub const PURGE_INTERVAL_SECS: u64 = 3600;
    pub const FETCH_CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const FETCH_TIMEOUT_SECS: u64 = 60;
    pub const FETCH_RETRIES: u32 = 2;
    pub const MAX_CONCURRENT_FETCHES: usize = 8;
    pub const DB_MAX_CONNECTIONS: u32 = 10;
    pub const DB_MIN_CONNECTIONS: u32 = 1;
    pub const DB_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Connection string (postgres://...)
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

/// CI provider (Travis CI API v3) settings.
#[derive(Debug, Clone)]
pub struct CiSettings {
    /// API root, without trailing slash
    pub base_url: String,
    /// API token sent as `Authorization: token ...`
    pub token: Option<SecretString>,
    /// Repository slug, e.g. `ray-project/ray`
    pub repo_slug: String,
    /// Branch whose builds are tracked
    pub branch: String,
    /// Build event type (push builds only by default)
    pub event_type: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Retries for transient failures (transport errors, 5xx, 429)
    pub max_retries: u32,
}

impl Default for CiSettings {
    fn default() -> Self {
        CiSettings {
            base_url: defaults::CI_API_BASE_URL.to_string(),
            token: None,
            repo_slug: defaults::CI_REPO_SLUG.to_string(),
            branch: defaults::CI_BRANCH.to_string(),
            event_type: defaults::CI_EVENT_TYPE.to_string(),
            connect_timeout_secs: defaults::FETCH_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: defaults::FETCH_TIMEOUT_SECS,
            max_retries: defaults::FETCH_RETRIES,
        }
    }
}

impl CiSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Ingestion and aggregation tuning.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Job slots recorded per build
    pub jobs_per_build: usize,
    /// Default number of builds in a dashboard matrix
    pub window_size: usize,
    /// Builds fetched per ingestion batch
    pub ingest_limit: usize,
    /// Seconds between scheduled ingestion batches (0 disables the scheduler)
    pub ingest_interval_secs: u64,
    /// Retention for everything written by ingestion
    pub retention_secs: u64,
    /// Seconds between purges of expired store entries
    pub purge_interval_secs: u64,
    /// Concurrent job log fetches during ingestion
    pub max_concurrent_fetches: usize,
}

impl TrackerSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        TrackerSettings {
            jobs_per_build: defaults::JOBS_PER_BUILD,
            window_size: defaults::WINDOW_SIZE,
            ingest_limit: defaults::INGEST_LIMIT,
            ingest_interval_secs: defaults::INGEST_INTERVAL_SECS,
            retention_secs: defaults::RETENTION_SECS,
            purge_interval_secs: defaults::PURGE_INTERVAL_SECS,
            max_concurrent_fetches: defaults::MAX_CONCURRENT_FETCHES,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database settings; `None` selects the in-memory store (development only)
    pub database: Option<DatabaseSettings>,
    /// Directory for static dashboard assets
    pub static_dir: Option<PathBuf>,
    /// CI provider settings
    pub ci: CiSettings,
    /// Ingestion and aggregation settings
    pub tracker: TrackerSettings,
}

impl Default for Config {
    /// Development configuration with every default applied and the in-memory store.
    fn default() -> Self {
        Config {
            environment: Environment::Development,
            host: defaults::DEV_HOST.to_string(),
            port: defaults::DEV_PORT,
            database: None,
            static_dir: None,
            ci: CiSettings::default(),
            tracker: TrackerSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development):
    /// - All variables have sensible defaults
    /// - Without DATABASE_URL an in-memory store is used
    /// - Without CI_API_TOKEN requests are sent unauthenticated
    ///
    /// In production mode (RUST_ENV=production):
    /// - DATABASE_URL and CI_API_TOKEN are required
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `TRACKER_HOST`: Server host (default: 127.0.0.1)
    /// - `TRACKER_PORT`: Server port (default: 8080)
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `TRACKER_DB_MAX_CONNECTIONS` / `TRACKER_DB_MIN_CONNECTIONS`: pool size
    /// - `TRACKER_STATIC_DIR`: Static dashboard assets directory
    /// - `CI_API_BASE_URL`: CI API root (default: https://api.travis-ci.com)
    /// - `CI_API_TOKEN`: CI API token
    /// - `CI_REPO_SLUG`: Tracked repository (default: ray-project/ray)
    /// - `CI_BRANCH`: Tracked branch (default: master)
    /// - `TRACKER_FETCH_TIMEOUT_SECS`: Per-request timeout (default: 60)
    /// - `TRACKER_FETCH_RETRIES`: Retries for transient failures (default: 2)
    /// - `TRACKER_JOBS_PER_BUILD`: Job slots per build (default: 4)
    /// - `TRACKER_WINDOW_SIZE`: Builds per dashboard matrix (default: 10)
    /// - `TRACKER_INGEST_LIMIT`: Builds per ingestion batch (default: 25)
    /// - `TRACKER_INGEST_INTERVAL_SECS`: Ingestion period, 0 disables (default: 900)
    /// - `TRACKER_RETENTION_SECS`: Retention TTL (default: one week)
    /// - `TRACKER_MAX_CONCURRENT_FETCHES`: Parallel log fetches (default: 8)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Parse environment - required
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("TRACKER_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());
        let port = parse_var(
            "TRACKER_PORT",
            defaults::DEV_PORT,
            "TRACKER_PORT must be a valid port number",
        )?;

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseSettings {
                url,
                max_connections: parse_var(
                    "TRACKER_DB_MAX_CONNECTIONS",
                    defaults::DB_MAX_CONNECTIONS,
                    "TRACKER_DB_MAX_CONNECTIONS must be a valid number",
                )?,
                min_connections: parse_var(
                    "TRACKER_DB_MIN_CONNECTIONS",
                    defaults::DB_MIN_CONNECTIONS,
                    "TRACKER_DB_MIN_CONNECTIONS must be a valid number",
                )?,
                connect_timeout_secs: defaults::DB_CONNECT_TIMEOUT_SECS,
            }),
            _ => None,
        };

        let static_dir = env::var("TRACKER_STATIC_DIR").ok().map(PathBuf::from);

        let ci = CiSettings {
            base_url: env::var("CI_API_BASE_URL")
                .unwrap_or_else(|_| defaults::CI_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: env::var("CI_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            repo_slug: env::var("CI_REPO_SLUG")
                .unwrap_or_else(|_| defaults::CI_REPO_SLUG.to_string()),
            branch: env::var("CI_BRANCH").unwrap_or_else(|_| defaults::CI_BRANCH.to_string()),
            event_type: defaults::CI_EVENT_TYPE.to_string(),
            connect_timeout_secs: defaults::FETCH_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: parse_var(
                "TRACKER_FETCH_TIMEOUT_SECS",
                defaults::FETCH_TIMEOUT_SECS,
                "TRACKER_FETCH_TIMEOUT_SECS must be a valid number",
            )?,
            max_retries: parse_var(
                "TRACKER_FETCH_RETRIES",
                defaults::FETCH_RETRIES,
                "TRACKER_FETCH_RETRIES must be a valid number",
            )?,
        };

        let tracker = TrackerSettings {
            jobs_per_build: parse_var(
                "TRACKER_JOBS_PER_BUILD",
                defaults::JOBS_PER_BUILD,
                "TRACKER_JOBS_PER_BUILD must be a valid number",
            )?,
            window_size: parse_var(
                "TRACKER_WINDOW_SIZE",
                defaults::WINDOW_SIZE,
                "TRACKER_WINDOW_SIZE must be a valid number",
            )?,
            ingest_limit: parse_var(
                "TRACKER_INGEST_LIMIT",
                defaults::INGEST_LIMIT,
                "TRACKER_INGEST_LIMIT must be a valid number",
            )?,
            ingest_interval_secs: parse_var(
                "TRACKER_INGEST_INTERVAL_SECS",
                defaults::INGEST_INTERVAL_SECS,
                "TRACKER_INGEST_INTERVAL_SECS must be a valid number",
            )?,
            retention_secs: parse_var(
                "TRACKER_RETENTION_SECS",
                defaults::RETENTION_SECS,
                "TRACKER_RETENTION_SECS must be a valid number",
            )?,
            purge_interval_secs: defaults::PURGE_INTERVAL_SECS,
            max_concurrent_fetches: parse_var(
                "TRACKER_MAX_CONCURRENT_FETCHES",
                defaults::MAX_CONCURRENT_FETCHES,
                "TRACKER_MAX_CONCURRENT_FETCHES must be a valid number",
            )?,
        };

        let config = Config {
            environment,
            host,
            port,
            database,
            static_dir,
            ci,
            tracker,
        };

        config.validate()?;

        // Validate production configuration
        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Reject values that would make ingestion or aggregation meaningless.
    fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tracker;
        if t.jobs_per_build == 0 {
            return Err(ConfigError::InvalidValue(
                "TRACKER_JOBS_PER_BUILD must be positive",
            ));
        }
        if t.window_size == 0 || t.window_size > defaults::MAX_WINDOW_SIZE {
            return Err(ConfigError::InvalidValue(
                "TRACKER_WINDOW_SIZE must be between 1 and 100",
            ));
        }
        if t.ingest_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "TRACKER_INGEST_LIMIT must be positive",
            ));
        }
        if t.retention_secs == 0 || t.retention_secs > defaults::MAX_RETENTION_SECS {
            return Err(ConfigError::InvalidValue(
                "TRACKER_RETENTION_SECS must be between 1 and 31536000",
            ));
        }
        if t.max_concurrent_fetches == 0 {
            return Err(ConfigError::InvalidValue(
                "TRACKER_MAX_CONCURRENT_FETCHES must be positive",
            ));
        }
        if self.ci.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "TRACKER_FETCH_TIMEOUT_SECS must be positive",
            ));
        }
        Ok(())
    }

    /// Validate that production configuration does not rely on development fallbacks.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database.is_none() {
            errors.push(
                "DATABASE_URL is not set. The in-memory store is for development only."
                    .to_string(),
            );
        }

        if self.ci.token.is_none() {
            errors.push("CI_API_TOKEN is not set. Set a CI provider API token.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Read and parse an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(
    name: &'static str,
    default: T,
    message: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(message)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
