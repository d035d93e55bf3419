//! Product catalog lookups.
//!
//! The cart treats the catalog as the read-only source of truth for price,
//! status and stock at the moment an item is added. [`HttpCatalog`] talks to
//! the MarketHub API; [`InMemoryCatalog`] serves fixed data for tests and
//! offline use.

use std::collections::HashMap;

use async_trait::async_trait;
use markethub_core::{ProductId, ProductSnapshot};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use crate::remote::endpoint;

/// Errors from a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No product has the given ID.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The catalog could not be reached or answered unexpectedly.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read access to product records.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch the current snapshot of a product.
    async fn get_product(&self, id: &ProductId) -> Result<ProductSnapshot, CatalogError>;
}

// =============================================================================
// HttpCatalog
// =============================================================================

/// Catalog backed by `GET /api/products/{id}`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalog {
    /// Create a catalog client for the API at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CatalogStore for HttpCatalog {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<ProductSnapshot, CatalogError> {
        let url = endpoint(&self.base_url, &["api", "products", id.as_str()])
            .ok_or_else(|| CatalogError::Unavailable(format!("bad base URL {}", self.base_url)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("product not in catalog");
            return Err(CatalogError::NotFound(id.clone()));
        }
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "catalog returned {status}"
            )));
        }

        response
            .json::<ProductSnapshot>()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))
    }
}

// =============================================================================
// InMemoryCatalog
// =============================================================================

/// Catalog holding products in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, ProductSnapshot>>,
}

impl InMemoryCatalog {
    /// Create a catalog seeded with `products`.
    #[must_use]
    pub fn new(products: impl IntoIterator<Item = ProductSnapshot>) -> Self {
        let products = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        Self {
            products: RwLock::new(products),
        }
    }

    /// Insert or replace a product.
    pub async fn upsert(&self, product: ProductSnapshot) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Delete a product, returning it if it existed.
    pub async fn remove(&self, id: &ProductId) -> Option<ProductSnapshot> {
        self.products.write().await.remove(id)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<ProductSnapshot, CatalogError> {
        self.products
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use markethub_core::{Inventory, Money, ProductStatus};

    use super::*;

    fn lamp() -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new("lamp"),
            name: "Desk Lamp".to_string(),
            price: Money::from_cents(2000),
            original_price: None,
            inventory: Inventory::Untracked,
            status: ProductStatus::Active,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let catalog = InMemoryCatalog::new([lamp()]);
        let product = catalog.get_product(&ProductId::new("lamp")).await.unwrap();
        assert_eq!(product.name, "Desk Lamp");

        let missing = catalog.get_product(&ProductId::new("sofa")).await;
        assert_eq!(missing, Err(CatalogError::NotFound(ProductId::new("sofa"))));
    }

    #[tokio::test]
    async fn test_upsert_replaces_price() {
        let catalog = InMemoryCatalog::new([lamp()]);
        let mut cheaper = lamp();
        cheaper.price = Money::from_cents(1500);
        catalog.upsert(cheaper).await;

        let product = catalog.get_product(&ProductId::new("lamp")).await.unwrap();
        assert_eq!(product.price, Money::from_cents(1500));

        catalog.remove(&ProductId::new("lamp")).await;
        assert!(catalog.get_product(&ProductId::new("lamp")).await.is_err());
    }
}
