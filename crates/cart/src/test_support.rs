//! Fixtures shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use markethub_core::{
    Cart, Inventory, LineItem, LineKey, Money, ProductId, ProductSnapshot, ProductStatus, Quantity,
    VariantSelection,
};

use crate::remote::{RemoteCartService, RemoteError};

pub fn product(id: &str, cents: i64) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Money::from_cents(cents),
        original_price: None,
        inventory: Inventory::Untracked,
        status: ProductStatus::Active,
        image: None,
    }
}

pub fn tracked(id: &str, cents: i64, available: u32) -> ProductSnapshot {
    ProductSnapshot {
        inventory: Inventory::Tracked { available },
        ..product(id, cents)
    }
}

/// Account cart service holding one cart in memory, applying the same
/// increment-if-exists rule as the real service.
#[derive(Debug, Default)]
pub struct FakeRemote {
    products: HashMap<ProductId, ProductSnapshot>,
    cart: Mutex<Cart>,
    failing: Mutex<HashSet<ProductId>>,
    failing_adds: Mutex<HashSet<ProductId>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new(products: impl IntoIterator<Item = ProductSnapshot>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..Self::default()
        }
    }

    /// Seed the account cart.
    pub fn with_line(self, id: &str, quantity: u32) -> Self {
        let product = self.products.get(&ProductId::new(id)).cloned().unwrap();
        self.cart
            .lock()
            .unwrap()
            .add(product, Quantity::new(quantity).unwrap(), None, Utc::now())
            .unwrap();
        self
    }

    /// Make every add or remove for `id` fail.
    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(ProductId::new(id));
    }

    /// Make every add for `id` fail while removes still succeed.
    pub fn fail_adds_on(&self, id: &str) {
        self.failing_adds.lock().unwrap().insert(ProductId::new(id));
    }

    pub fn quantity_of(&self, id: &str) -> u32 {
        self.cart.lock().unwrap().quantity_of(&ProductId::new(id))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, id: &ProductId) -> Result<(), RemoteError> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(RemoteError::Rejected {
                status: 503,
                reason: None,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn rejected(err: &markethub_core::CartRuleError) -> RemoteError {
    RemoteError::Rejected {
        status: 409,
        reason: Some(err.reason().to_string()),
        message: err.to_string(),
    }
}

#[async_trait]
impl RemoteCartService for FakeRemote {
    async fn fetch(&self) -> Result<Vec<LineItem>, RemoteError> {
        self.calls.lock().unwrap().push("fetch".to_string());
        Ok(self.cart.lock().unwrap().items().to_vec())
    }

    async fn add(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        variant: Option<&VariantSelection>,
    ) -> Result<Vec<LineItem>, RemoteError> {
        self.calls.lock().unwrap().push(format!("add {product_id} {quantity}"));
        self.check(product_id)?;
        if self.failing_adds.lock().unwrap().contains(product_id) {
            return Err(RemoteError::Rejected {
                status: 503,
                reason: None,
                message: "service unavailable".to_string(),
            });
        }
        let product = self.products.get(product_id).cloned().ok_or_else(|| {
            rejected(&markethub_core::CartRuleError::ProductUnavailable(product_id.clone()))
        })?;
        let mut cart = self.cart.lock().unwrap();
        cart.add(product, quantity, variant.cloned(), Utc::now())
            .map_err(|e| rejected(&e))?;
        Ok(cart.items().to_vec())
    }

    async fn remove(&self, key: &LineKey) -> Result<Vec<LineItem>, RemoteError> {
        self.calls.lock().unwrap().push(format!("remove {key}"));
        self.check(&key.product_id)?;
        let mut cart = self.cart.lock().unwrap();
        cart.remove(key).map_err(|e| rejected(&e))?;
        Ok(cart.items().to_vec())
    }
}

/// Connector that hands every session the same fake service.
#[derive(Debug, Clone)]
pub struct FakeConnector(pub std::sync::Arc<FakeRemote>);

impl crate::remote::RemoteConnector for FakeConnector {
    fn connect(
        &self,
        _session: &crate::auth::AccountSession,
    ) -> std::sync::Arc<dyn RemoteCartService> {
        self.0.clone()
    }
}
