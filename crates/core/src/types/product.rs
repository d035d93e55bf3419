//! Product snapshot copied into a cart at add-time.

use serde::{Deserialize, Serialize};

use super::{Money, ProductId, ProductStatus};

/// Stock tracking for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "tracking", rename_all = "snake_case")]
pub enum Inventory {
    /// Stock is not tracked; any quantity may be ordered.
    #[default]
    Untracked,
    /// Stock is tracked and `available` units remain.
    Tracked {
        /// Units currently available for sale.
        available: u32,
    },
}

impl Inventory {
    /// Whether `quantity` units can be supplied.
    #[must_use]
    pub const fn can_supply(self, quantity: u32) -> bool {
        match self {
            Self::Untracked => true,
            Self::Tracked { available } => quantity <= available,
        }
    }

    /// Units available, or `None` when stock is not tracked.
    #[must_use]
    pub const fn available(self) -> Option<u32> {
        match self {
            Self::Untracked => None,
            Self::Tracked { available } => Some(available),
        }
    }
}

/// The catalog data a line item carries.
///
/// Copied from the catalog when the item is added and not live-joined
/// afterwards, so a later price change does not alter what the cart shows
/// until the snapshot is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Catalog ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price at snapshot time.
    pub price: Money,
    /// Pre-discount price, when the product is on sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    /// Stock level at snapshot time.
    #[serde(default)]
    pub inventory: Inventory,
    /// Catalog status at snapshot time.
    #[serde(default)]
    pub status: ProductStatus,
    /// Primary image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
