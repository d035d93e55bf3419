//! Line items and the in-memory cart.
//!
//! [`Cart`] enforces the per-item invariants shared by the client cart engine
//! and the account cart service:
//!
//! - at most one [`LineItem`] per `(product id, variant)` pair
//! - every quantity is at least 1
//! - products must be active, and tracked stock must cover the line quantity
//!
//! Mutations are all-or-nothing: a rejected call leaves the cart untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::{
    Inventory, Money, ProductId, ProductSnapshot, Quantity, QuantityError, VariantSelection,
};

/// Reasons a cart operation is rejected before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartRuleError {
    /// Quantity is zero, negative, or too large.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// No product ID was supplied.
    #[error("missing product id")]
    MissingProductId,

    /// Product does not exist or is not active.
    #[error("product unavailable: {0}")]
    ProductUnavailable(ProductId),

    /// Product is tracked and has no stock left.
    #[error("out of stock: {0}")]
    OutOfStock(ProductId),

    /// Product is tracked and the requested quantity exceeds the stock.
    #[error("insufficient stock for {product_id}: requested {requested}, only {available} available")]
    InsufficientStock {
        /// Product that ran short.
        product_id: ProductId,
        /// Line quantity that was requested.
        requested: u32,
        /// Units in stock.
        available: u32,
    },

    /// No line matches the given key.
    #[error("item not found: {0}")]
    ItemNotFound(LineKey),

    /// The product has several variant lines and a single line was expected.
    #[error("{0} has more than one line; select a variant")]
    AmbiguousLine(ProductId),
}

impl CartRuleError {
    /// Stable machine-readable code for the failure.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::MissingProductId => "missing_product_id",
            Self::ProductUnavailable(_) => "product_unavailable",
            Self::OutOfStock(_) => "out_of_stock",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::ItemNotFound(_) => "item_not_found",
            Self::AmbiguousLine(_) => "ambiguous_line",
        }
    }

    /// Whether the failure is about the product's availability rather than
    /// the shape of the request.
    #[must_use]
    pub const fn is_availability(&self) -> bool {
        matches!(
            self,
            Self::ProductUnavailable(_) | Self::OutOfStock(_) | Self::InsufficientStock { .. }
        )
    }
}

/// Identity of a line within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Selected options, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantSelection>,
}

impl LineKey {
    /// Key for a line with the given selection. Empty selections mean "no variant".
    #[must_use]
    pub fn new(product_id: ProductId, variant: Option<VariantSelection>) -> Self {
        Self {
            product_id,
            variant: VariantSelection::normalize(variant),
        }
    }
}

impl From<ProductId> for LineKey {
    fn from(product_id: ProductId) -> Self {
        Self {
            product_id,
            variant: None,
        }
    }
}

impl From<&ProductId> for LineKey {
    fn from(product_id: &ProductId) -> Self {
        Self::from(product_id.clone())
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{} [{variant}]", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// One product + variant + quantity entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Catalog data copied when the line was created.
    pub product: ProductSnapshot,
    /// Units on this line.
    pub quantity: Quantity,
    /// Selected options, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantSelection>,
    /// When the line was first added.
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// The line's identity.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product.id.clone(),
            variant: self.variant.clone(),
        }
    }

    /// Whether this line has the given identity.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product.id == key.product_id && self.variant == key.variant
    }

    /// Unit price times quantity, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price * self.quantity.get()
    }
}

/// Check that `product` may be sold in a line of `quantity` units.
///
/// # Errors
///
/// - [`CartRuleError::ProductUnavailable`] if the product is not active
/// - [`CartRuleError::OutOfStock`] if stock is tracked and none is left
/// - [`CartRuleError::InsufficientStock`] if stock is tracked and short
pub fn check_purchasable(product: &ProductSnapshot, quantity: Quantity) -> Result<(), CartRuleError> {
    if !product.status.is_purchasable() {
        return Err(CartRuleError::ProductUnavailable(product.id.clone()));
    }
    if product.inventory.can_supply(quantity.get()) {
        return Ok(());
    }
    match product.inventory {
        Inventory::Tracked { available } if available > 0 => Err(CartRuleError::InsufficientStock {
            product_id: product.id.clone(),
            requested: quantity.get(),
            available,
        }),
        _ => Err(CartRuleError::OutOfStock(product.id.clone())),
    }
}

/// An ordered collection of line items for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from stored items, merging any duplicate keys so the
    /// one-line-per-key invariant holds.
    ///
    /// A duplicate that would push a line past [`Quantity::MAX`] is dropped
    /// with a warning.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            let key = item.key();
            let Some(existing) = cart.items.iter_mut().find(|line| line.matches(&key)) else {
                cart.items.push(item);
                continue;
            };
            match existing.quantity.checked_add(item.quantity) {
                Ok(sum) => existing.quantity = sum,
                Err(e) => warn!(
                    line = %key,
                    kept = existing.quantity.get(),
                    dropped = item.quantity.get(),
                    error = %e,
                    "duplicate cart line exceeds the quantity cap"
                ),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity.get()).sum()
    }

    /// The line with the given identity.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&LineItem> {
        self.items.iter().find(|item| item.matches(key))
    }

    /// Whether any line refers to `product_id`, whatever its variant.
    #[must_use]
    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product.id == product_id)
    }

    /// Units of `product_id` across all of its variant lines.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .filter(|item| &item.product.id == product_id)
            .map(|item| item.quantity.get())
            .sum()
    }

    /// Key of the single line for `product_id`.
    ///
    /// # Errors
    ///
    /// - [`CartRuleError::ItemNotFound`] if the product is not in the cart
    /// - [`CartRuleError::AmbiguousLine`] if it has more than one variant line
    pub fn line_for_product(&self, product_id: &ProductId) -> Result<LineKey, CartRuleError> {
        let mut lines = self.items.iter().filter(|item| &item.product.id == product_id);
        match (lines.next(), lines.next()) {
            (Some(line), None) => Ok(line.key()),
            (Some(_), Some(_)) => Err(CartRuleError::AmbiguousLine(product_id.clone())),
            (None, _) => Err(CartRuleError::ItemNotFound(LineKey::from(product_id))),
        }
    }

    /// Add `quantity` units of `product` and return the line's new quantity.
    ///
    /// A line with the same `(product id, variant)` is incremented instead of
    /// duplicated; its snapshot is kept. Stock is checked against the
    /// resulting line quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`CartRuleError`] if the product ID is blank, the product is
    /// not purchasable, or stock would be exceeded. The cart is unchanged on
    /// error.
    pub fn add(
        &mut self,
        product: ProductSnapshot,
        quantity: Quantity,
        variant: Option<VariantSelection>,
        now: DateTime<Utc>,
    ) -> Result<Quantity, CartRuleError> {
        if product.id.is_blank() {
            return Err(CartRuleError::MissingProductId);
        }
        let key = LineKey::new(product.id.clone(), variant);

        if let Some(existing) = self.items.iter_mut().find(|item| item.matches(&key)) {
            let resulting = existing.quantity.checked_add(quantity)?;
            check_purchasable(&product, resulting)?;
            existing.quantity = resulting;
            return Ok(resulting);
        }

        check_purchasable(&product, quantity)?;
        self.items.push(LineItem {
            product,
            quantity,
            variant: key.variant,
            added_at: now,
        });
        Ok(quantity)
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of zero or less removes the line. Returns the updated line,
    /// or `None` when it was removed.
    ///
    /// # Errors
    ///
    /// - [`CartRuleError::ItemNotFound`] if no line matches `key`
    /// - [`CartRuleError::InvalidQuantity`] if `quantity` is too large
    /// - an availability error if the line's snapshot shows too little stock
    pub fn set_quantity(
        &mut self,
        key: &LineKey,
        quantity: i64,
    ) -> Result<Option<&LineItem>, CartRuleError> {
        if quantity <= 0 {
            self.remove(key)?;
            return Ok(None);
        }
        let quantity = Quantity::try_from_signed(quantity)?;
        let line = self
            .items
            .iter_mut()
            .find(|item| item.matches(key))
            .ok_or_else(|| CartRuleError::ItemNotFound(key.clone()))?;
        check_purchasable(&line.product, quantity)?;
        line.quantity = quantity;
        Ok(Some(&*line))
    }

    /// Remove the line with the given identity and return it.
    ///
    /// # Errors
    ///
    /// Returns [`CartRuleError::ItemNotFound`] if no line matches `key`.
    pub fn remove(&mut self, key: &LineKey) -> Result<LineItem, CartRuleError> {
        let index = self
            .items
            .iter()
            .position(|item| item.matches(key))
            .ok_or_else(|| CartRuleError::ItemNotFound(key.clone()))?;
        Ok(self.items.remove(index))
    }

    /// Remove every line for `product_id`, whatever its variant.
    ///
    /// # Errors
    ///
    /// Returns [`CartRuleError::ItemNotFound`] if the product is not in the cart.
    pub fn remove_product(&mut self, product_id: &ProductId) -> Result<Vec<LineItem>, CartRuleError> {
        if !self.contains_product(product_id) {
            return Err(CartRuleError::ItemNotFound(LineKey::from(product_id)));
        }
        let (removed, kept) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| &item.product.id == product_id);
        self.items = kept;
        Ok(removed)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
