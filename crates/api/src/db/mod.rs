//! Storage for products, account carts and account sessions.
//!
//! # Tables
//!
//! - `products` - Catalog records read by the cart at add time
//! - `accounts` - Account IDs
//! - `account_sessions` - Bearer tokens resolved to accounts
//! - `account_carts` - One JSON cart document per account
//!
//! Each concern is a trait with a `PostgreSQL` implementation
//! ([`postgres`]) and an in-memory one ([`memory`]) used by tests and by
//! servers started without a database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p markethub-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use markethub_core::{AccountId, LineItem, ProductId, ProductSnapshot};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::InMemoryStore;
pub use postgres::{PgCartRepository, PgProductRepository, PgSessionRepository};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Catalog reads and writes.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Get a product by ID.
    async fn get(&self, id: &ProductId) -> Result<Option<ProductSnapshot>, RepositoryError>;

    /// Insert or replace a product.
    async fn upsert(&self, product: &ProductSnapshot) -> Result<(), RepositoryError>;
}

/// Account cart documents.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Load an account's cart. Accounts without a cart have an empty one.
    async fn load(&self, account: &AccountId) -> Result<Vec<LineItem>, RepositoryError>;

    /// Replace an account's cart. The last write wins.
    async fn save(&self, account: &AccountId, items: &[LineItem]) -> Result<(), RepositoryError>;
}

/// Bearer token lookups.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// The account a live token belongs to.
    async fn resolve(&self, token: &str) -> Result<Option<AccountId>, RepositoryError>;
}

/// The repositories a server runs against.
#[derive(Clone)]
pub struct Repositories {
    /// Catalog.
    pub products: Arc<dyn ProductRepository>,
    /// Account carts.
    pub carts: Arc<dyn CartRepository>,
    /// Account sessions.
    pub sessions: Arc<dyn SessionRepository>,
    pool: Option<PgPool>,
}

impl Repositories {
    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            products: Arc::new(PgProductRepository::new(pool.clone())),
            carts: Arc::new(PgCartRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repositories backed by one in-memory store.
    #[must_use]
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            products: store.clone(),
            carts: store.clone(),
            sessions: store,
            pool: None,
        }
    }

    /// Check that the backing store answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database cannot be reached.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
