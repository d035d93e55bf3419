//! CLI command implementations.

pub mod cart;
pub mod migrate;
pub mod products;
pub mod session;

use markethub_api::ApiConfig;
use markethub_api::config::ConfigError;
use markethub_api::db::{self, RepositoryError};
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Input file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file is not valid JSON for the expected shape.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Input parsed but failed validation.
    #[error("Invalid input: {0}")]
    Invalid(String),
}

/// Connect to the API database named by `MARKETHUB_DATABASE_URL`
/// (or `DATABASE_URL`), read the same way the API server reads it.
pub async fn connect() -> Result<PgPool, CliError> {
    let config = ApiConfig::from_env()?;
    let database_url = config.require_database_url()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(database_url).await?)
}
