//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKETHUB_API_URL` - Base URL of the MarketHub API (catalog and account carts)
//!
//! ## Optional
//! - `MARKETHUB_CART_DIR` - Directory for the guest cart file (default: .markethub)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_CART_DIR: &str = ".markethub";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartClientConfig {
    /// Base URL of the MarketHub API
    pub api_url: Url,
    /// Directory holding the guest cart file
    pub cart_dir: PathBuf,
}

impl CartClientConfig {
    /// Create a configuration for the API at `api_url` with the default
    /// cart directory.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            cart_dir: PathBuf::from(DEFAULT_CART_DIR),
        }
    }

    /// Store the guest cart under `dir`.
    #[must_use]
    pub fn with_cart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cart_dir = dir.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `MARKETHUB_API_URL` is missing or not an
    /// absolute http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("MARKETHUB_API_URL")?)?;
        let cart_dir = get_env_or_default("MARKETHUB_CART_DIR", DEFAULT_CART_DIR);

        Ok(Self::new(api_url).with_cart_dir(cart_dir))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and validate the API base URL.
fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("MARKETHUB_API_URL".to_string(), msg);
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("must be a base URL".to_string()));
    }
    Ok(url)
}
