//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MARKETHUB_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either the service keeps data in memory)
//! - `MARKETHUB_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKETHUB_PORT` - Listen port (default: 5000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MARKETHUB_DATABASE_URL");
        let host = get_env_or_default("MARKETHUB_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKETHUB_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MARKETHUB_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKETHUB_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Database URL, or an error naming the variable to set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no database is configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("MARKETHUB_DATABASE_URL".to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| parse_rate(key, &value))
}

fn parse_rate(key: &str, value: &str) -> Result<f32, ConfigError> {
    let rate = value
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}
