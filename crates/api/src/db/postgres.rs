//! `PostgreSQL` repositories.

use async_trait::async_trait;
use markethub_core::{
    AccountId, Inventory, LineItem, Money, ProductId, ProductSnapshot, ProductStatus,
};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use super::{CartRepository, ProductRepository, RepositoryError, SessionRepository};

// =============================================================================
// Products
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Money,
    original_price: Option<Money>,
    stock: Option<i32>,
    status: String,
    image: Option<String>,
}

impl TryFrom<ProductRow> for ProductSnapshot {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let inventory = match row.stock {
            None => Inventory::Untracked,
            Some(stock) => Inventory::Tracked {
                available: u32::try_from(stock).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "negative stock {stock} for product {}",
                        row.id
                    ))
                })?,
            },
        };
        let status = row
            .status
            .parse::<ProductStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            name: row.name,
            price: row.price,
            original_price: row.original_price,
            inventory,
            status,
            image: row.image,
        })
    }
}

/// Catalog stored in the `products` table.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get(&self, id: &ProductId) -> Result<Option<ProductSnapshot>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, original_price, stock, status, image
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductSnapshot::try_from).transpose()
    }

    #[instrument(skip_all, fields(product_id = %product.id))]
    async fn upsert(&self, product: &ProductSnapshot) -> Result<(), RepositoryError> {
        let stock = product
            .inventory
            .available()
            .map(i32::try_from)
            .transpose()
            .map_err(|_| {
                RepositoryError::DataCorruption(format!("stock too large for {}", product.id))
            })?;

        sqlx::query(
            r"
            INSERT INTO products (id, name, price, original_price, stock, status, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                original_price = EXCLUDED.original_price,
                stock = EXCLUDED.stock,
                status = EXCLUDED.status,
                image = EXCLUDED.image,
                updated_at = now()
            ",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.original_price)
        .bind(stock)
        .bind(product.status.to_string())
        .bind(product.image.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Carts
// =============================================================================

/// Account carts stored as JSON documents in `account_carts`.
#[derive(Debug, Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    #[instrument(skip(self), fields(account_id = %account))]
    async fn load(&self, account: &AccountId) -> Result<Vec<LineItem>, RepositoryError> {
        let items: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT items FROM account_carts WHERE account_id = $1")
                .bind(account)
                .fetch_optional(&self.pool)
                .await?;

        match items {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid cart for {account}: {e}"))
            }),
        }
    }

    #[instrument(skip(self, items), fields(account_id = %account, lines = items.len()))]
    async fn save(&self, account: &AccountId, items: &[LineItem]) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO account_carts (account_id, items, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (account_id) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = now()
            ",
        )
        .bind(account)
        .bind(Json(items))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound(format!("account {account}"))
            }
            other => RepositoryError::Database(other),
        })?;
        Ok(())
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Bearer tokens stored in `account_sessions`.
#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    #[instrument(skip_all)]
    async fn resolve(&self, token: &str) -> Result<Option<AccountId>, RepositoryError> {
        let account: Option<AccountId> = sqlx::query_scalar(
            r"
            SELECT account_id
            FROM account_sessions
            WHERE token = $1
              AND (expires_at IS NULL OR expires_at > now())
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }
}
