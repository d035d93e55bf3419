//! In-memory repositories.
//!
//! Used by tests and by servers started without `MARKETHUB_DATABASE_URL`.
//! Data lives as long as the process.

use std::collections::HashMap;

use async_trait::async_trait;
use markethub_core::{AccountId, LineItem, ProductId, ProductSnapshot};
use tokio::sync::RwLock;

use super::{CartRepository, ProductRepository, RepositoryError, SessionRepository};

/// Products, carts and sessions held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    products: RwLock<HashMap<ProductId, ProductSnapshot>>,
    carts: RwLock<HashMap<AccountId, Vec<LineItem>>>,
    sessions: RwLock<HashMap<String, AccountId>>,
}

impl InMemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = ProductSnapshot>) -> Self {
        let products = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        Self {
            products: RwLock::new(products),
            ..Self::default()
        }
    }

    /// Register a bearer token for `account`.
    pub async fn insert_session(&self, token: impl Into<String>, account: AccountId) {
        self.sessions.write().await.insert(token.into(), account);
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn get(&self, id: &ProductId) -> Result<Option<ProductSnapshot>, RepositoryError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn upsert(&self, product: &ProductSnapshot) -> Result<(), RepositoryError> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn load(&self, account: &AccountId) -> Result<Vec<LineItem>, RepositoryError> {
        Ok(self
            .carts
            .read()
            .await
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, account: &AccountId, items: &[LineItem]) -> Result<(), RepositoryError> {
        self.carts
            .write()
            .await
            .insert(account.clone(), items.to_vec());
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn resolve(&self, token: &str) -> Result<Option<AccountId>, RepositoryError> {
        Ok(self.sessions.read().await.get(token).cloned())
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
    async fn test_products() {
        let store = InMemoryStore::with_products([lamp()]);
        assert!(store.get(&ProductId::new("lamp")).await.unwrap().is_some());
        assert!(store.get(&ProductId::new("mug")).await.unwrap().is_none());

        let mut cheaper = lamp();
        cheaper.price = Money::from_cents(1500);
        store.upsert(&cheaper).await.unwrap();
        let stored = store.get(&ProductId::new("lamp")).await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty() {
        let store = InMemoryStore::new();
        let account = AccountId::new("acct-1");
        assert!(store.load(&account).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions() {
        let store = InMemoryStore::new();
        store.insert_session("tok", AccountId::new("acct-1")).await;
        assert_eq!(
            store.resolve("tok").await.unwrap(),
            Some(AccountId::new("acct-1"))
        );
        assert_eq!(store.resolve("other").await.unwrap(), None);
    }
}
