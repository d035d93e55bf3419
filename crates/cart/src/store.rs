//! The cart store: one owner's cart plus the rules for changing it.
//!
//! Every mutation follows the same path:
//!
//! 1. validate the request and, for adds, fetch the product from the catalog
//! 2. apply the change to a copy of the cart, enforcing the line invariants
//! 3. hand the change to the persistence adapter
//! 4. adopt the items the adapter returns
//!
//! Rejected requests never reach the adapter, and a failed adapter call
//! leaves the store's cart exactly as it was. Mutations take `&mut self`, so
//! a single owner's calls are naturally serialized; there is no further
//! locking and the last write wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use markethub_core::{
    Cart, CartRuleError, CartTotals, LineItem, LineKey, Money, PricingPolicy, ProductId,
    ProductStatus, Quantity, VariantSelection,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{CatalogError, CatalogStore};
use crate::error::{CartError, PersistenceError, Result};
use crate::persistence::{AdapterKind, CartMutation, CartPersistence};

/// How a line's snapshot differs from the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum DriftKind {
    /// The product is no longer in the catalog.
    Discontinued,
    /// The unit price changed.
    PriceChanged {
        /// Price in the snapshot.
        from: Money,
        /// Current catalog price.
        to: Money,
    },
    /// The product can no longer be bought.
    NoLongerActive {
        /// Current catalog status.
        status: ProductStatus,
    },
    /// Stock dropped below the line quantity.
    StockBelowQuantity {
        /// Units now available.
        available: u32,
        /// Units on the line.
        quantity: u32,
    },
}

/// One difference between a cart line and the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDrift {
    /// Affected line.
    pub key: LineKey,
    /// What changed.
    #[serde(flatten)]
    pub kind: DriftKind,
}

/// Everything the order step needs from the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Lines as they stand in the cart.
    pub items: Vec<LineItem>,
    /// Totals for those lines.
    pub totals: CartTotals,
    /// Lines whose snapshot no longer matches the catalog.
    pub drift: Vec<SnapshotDrift>,
    /// When the draft was taken.
    pub prepared_at: DateTime<Utc>,
}

impl OrderDraft {
    /// Whether every line still matches the catalog.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.drift.is_empty()
    }
}

/// Holds one owner's cart and persists every change through an adapter.
pub struct CartStore {
    cart: Cart,
    catalog: Arc<dyn CatalogStore>,
    persistence: Arc<dyn CartPersistence>,
    pricing: PricingPolicy,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("adapter", &self.persistence.kind())
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open a store, loading the cart from `persistence`.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter cannot be read.
    #[instrument(skip_all, fields(adapter = ?persistence.kind()))]
    pub async fn open(
        catalog: Arc<dyn CatalogStore>,
        persistence: Arc<dyn CartPersistence>,
    ) -> Result<Self> {
        let items = persistence.load().await?;
        debug!(lines = items.len(), "loaded cart");
        Ok(Self::with_items(catalog, persistence, items))
    }

    /// Create a store from items already read from `persistence`.
    #[must_use]
    pub fn with_items(
        catalog: Arc<dyn CatalogStore>,
        persistence: Arc<dyn CartPersistence>,
        items: Vec<LineItem>,
    ) -> Self {
        Self {
            cart: Cart::from_items(items),
            catalog,
            persistence,
            pricing: PricingPolicy::default(),
        }
    }

    /// Which backend the store persists to.
    #[must_use]
    pub fn adapter_kind(&self) -> AdapterKind {
        self.persistence.kind()
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        self.cart.items()
    }

    /// Totals for the current lines. Derived on every call.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.pricing.totals(self.cart.items())
    }

    /// Whether any line refers to `product_id`.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.cart.contains_product(product_id)
    }

    /// Units of `product_id` in the cart, summed across variants.
    #[must_use]
    pub fn item_quantity(&self, product_id: &ProductId) -> u32 {
        self.cart.quantity_of(product_id)
    }

    /// Add `quantity` units of a product and return the line's new quantity.
    ///
    /// The product is fetched from the catalog now; its price, status and
    /// stock at this moment become the line's snapshot.
    ///
    /// # Errors
    ///
    /// - [`CartRuleError::MissingProductId`] or
    ///   [`CartRuleError::InvalidQuantity`] for malformed requests
    /// - [`CartRuleError::ProductUnavailable`] if the product is unknown or inactive
    /// - [`CartRuleError::OutOfStock`] / [`CartRuleError::InsufficientStock`]
    ///   when tracked stock cannot cover the resulting line
    /// - [`CartError::Persistence`] if the adapter fails
    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
    pub async fn add_item(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
        variant: Option<VariantSelection>,
    ) -> Result<Quantity> {
        if product_id.is_blank() {
            return Err(CartRuleError::MissingProductId.into());
        }
        let quantity = Quantity::new(quantity).map_err(CartRuleError::from)?;

        let product = self
            .catalog
            .get_product(product_id)
            .await
            .map_err(|e| match e {
                CatalogError::NotFound(id) => CartError::Rule(CartRuleError::ProductUnavailable(id)),
                other @ CatalogError::Unavailable(_) => CartError::Catalog(other),
            })?;

        let key = LineKey::new(product_id.clone(), variant);
        let mut candidate = self.cart.clone();
        let expected = candidate.add(product, quantity, key.variant.clone(), Utc::now())?;

        let mutation = CartMutation::Add {
            product_id: key.product_id.clone(),
            quantity,
            variant: key.variant.clone(),
        };
        self.commit(&mutation, &candidate).await?;

        let line_quantity = self.cart.get(&key).map_or(expected, |line| line.quantity);
        info!(quantity = line_quantity.get(), "added to cart");
        Ok(line_quantity)
    }

    /// Set the quantity of `product_id`'s line. Zero or less removes every
    /// line for the product.
    ///
    /// Returns the updated line, or `None` if the product was removed. A
    /// product with several variant lines has to be changed one line at a
    /// time through [`update_line`](Self::update_line).
    ///
    /// # Errors
    ///
    /// - [`CartRuleError::ItemNotFound`] if the product is not in the cart
    /// - [`CartRuleError::AmbiguousLine`] if a positive quantity is given for a
    ///   product with more than one line
    /// - an availability error if the line's snapshot shows too little stock
    /// - [`CartError::Persistence`] if the adapter fails
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Option<LineItem>> {
        if quantity <= 0 {
            self.remove_item(product_id).await?;
            return Ok(None);
        }
        let key = self.cart.line_for_product(product_id)?;
        self.update_line(key, quantity).await
    }

    /// Set one line's quantity. Zero or less removes the line.
    ///
    /// Returns the updated line, or `None` if it was removed.
    ///
    /// # Errors
    ///
    /// - [`CartRuleError::ItemNotFound`] if no line matches
    /// - an availability error if the line's snapshot shows too little stock
    /// - [`CartError::Persistence`] if the adapter fails
    #[instrument(skip(self, key), fields(line = %key))]
    pub async fn update_line(&mut self, key: LineKey, quantity: i64) -> Result<Option<LineItem>> {
        if quantity <= 0 {
            self.remove_line(key).await?;
            return Ok(None);
        }

        let previous = self
            .cart
            .get(&key)
            .ok_or_else(|| CartRuleError::ItemNotFound(key.clone()))?
            .quantity;
        let mut candidate = self.cart.clone();
        candidate.set_quantity(&key, quantity)?;
        let quantity = Quantity::try_from_signed(quantity).map_err(CartRuleError::from)?;

        let mutation = CartMutation::SetQuantity {
            key: key.clone(),
            quantity,
            previous,
        };
        self.commit(&mutation, &candidate).await?;
        Ok(self.cart.get(&key).cloned())
    }

    /// Remove every line for `product_id`, whatever its variant.
    ///
    /// # Errors
    ///
    /// - [`CartRuleError::ItemNotFound`] if the product is not in the cart
    /// - [`CartError::Persistence`] if the adapter fails
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub async fn remove_item(&mut self, product_id: &ProductId) -> Result<()> {
        let mut candidate = self.cart.clone();
        let removed = candidate.remove_product(product_id)?;
        let keys = removed.iter().map(LineItem::key).collect();
        self.commit(&CartMutation::Remove { keys }, &candidate).await
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// - [`CartRuleError::ItemNotFound`] if no line matches
    /// - [`CartError::Persistence`] if the adapter fails
    #[instrument(skip(self, key), fields(line = %key))]
    pub async fn remove_line(&mut self, key: LineKey) -> Result<()> {
        let mut candidate = self.cart.clone();
        candidate.remove(&key)?;
        self.commit(&CartMutation::Remove { keys: vec![key] }, &candidate)
            .await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the adapter fails.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<()> {
        self.commit(&CartMutation::Clear, &Cart::new()).await
    }

    /// Re-read the cart from the adapter, discarding the in-memory view.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the adapter cannot be read.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<()> {
        let items = self.persistence.load().await?;
        self.cart = Cart::from_items(items);
        Ok(())
    }

    /// Compare each line's snapshot against the live catalog.
    ///
    /// Read-only: the cart keeps its snapshots. Callers decide whether to
    /// show the differences, re-add lines, or proceed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Catalog`] if the catalog cannot be reached.
    #[instrument(skip(self))]
    pub async fn check_snapshots(&self) -> Result<Vec<SnapshotDrift>> {
        let mut drift = Vec::new();
        for line in self.cart.items() {
            let key = line.key();
            let current = match self.catalog.get_product(&line.product.id).await {
                Ok(product) => product,
                Err(CatalogError::NotFound(_)) => {
                    drift.push(SnapshotDrift {
                        key,
                        kind: DriftKind::Discontinued,
                    });
                    continue;
                }
                Err(e) => return Err(CartError::Catalog(e)),
            };

            if current.price != line.product.price {
                drift.push(SnapshotDrift {
                    key: key.clone(),
                    kind: DriftKind::PriceChanged {
                        from: line.product.price,
                        to: current.price,
                    },
                });
            }
            if !current.status.is_purchasable() {
                drift.push(SnapshotDrift {
                    key: key.clone(),
                    kind: DriftKind::NoLongerActive {
                        status: current.status,
                    },
                });
            }
            match current.inventory.available() {
                Some(available) if available < line.quantity.get() => {
                    drift.push(SnapshotDrift {
                        key,
                        kind: DriftKind::StockBelowQuantity {
                            available,
                            quantity: line.quantity.get(),
                        },
                    });
                }
                _ => {}
            }
        }
        if !drift.is_empty() {
            debug!(changes = drift.len(), "cart snapshots differ from catalog");
        }
        Ok(drift)
    }

    /// Collect the lines, totals and catalog drift for the order step.
    ///
    /// # Errors
    ///
    /// - [`CartError::EmptyCart`] if there is nothing to order
    /// - [`CartError::Catalog`] if the catalog cannot be reached
    #[instrument(skip(self))]
    pub async fn prepare_order(&self) -> Result<OrderDraft> {
        if self.cart.is_empty() {
            return Err(CartError::EmptyCart);
        }
        Ok(OrderDraft {
            items: self.cart.items().to_vec(),
            totals: self.totals(),
            drift: self.check_snapshots().await?,
            prepared_at: Utc::now(),
        })
    }

    /// Empty the cart after an order has been placed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the adapter fails.
    #[instrument(skip(self))]
    pub async fn order_placed(&mut self) -> Result<()> {
        info!(lines = self.cart.line_count(), "order placed, clearing cart");
        self.clear().await
    }

    /// Persist `mutation` and adopt the adapter's result.
    ///
    /// On failure the cart is kept, except that a line the adapter reports as
    /// dropped is removed so the view matches the backend.
    async fn commit(&mut self, mutation: &CartMutation, candidate: &Cart) -> Result<()> {
        let items = match self.persistence.apply(mutation, candidate).await {
            Ok(items) => items,
            Err(e) => {
                if let PersistenceError::LineDropped { key, .. } = &e
                    && self.cart.remove(key).is_ok()
                {
                    warn!(line = %key, "line no longer in the account cart");
                }
                return Err(e.into());
            }
        };
        self.cart = Cart::from_items(items);
        debug!(
            op = mutation.name(),
            lines = self.cart.line_count(),
            items = self.cart.item_count(),
            "cart updated"
        );
        Ok(())
    }
}
