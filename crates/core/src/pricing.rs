//! Cart totals: subtotal, tax, shipping, and grand total.
//!
//! Totals are derived on every read and never stored. The calculation is a
//! pure function of the line items, so calling it twice on the same items
//! yields identical results.
//!
//! | Figure     | Rule                                                    |
//! |------------|---------------------------------------------------------|
//! | subtotal   | Σ unit price × quantity, rounded to cents               |
//! | tax        | subtotal × tax rate (8%), rounded to cents              |
//! | shipping   | free when subtotal is strictly above 50.00, else 9.99   |
//! | total      | subtotal + tax + shipping, rounded to cents             |
//! | item count | Σ quantity                                              |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::types::Money;

/// Derived figures for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Sales tax on the subtotal.
    pub tax: Money,
    /// Shipping charge.
    pub shipping: Money,
    /// Amount due.
    pub total: Money,
    /// Total units across all lines.
    pub item_count: u32,
}

impl CartTotals {
    /// Whether the cart qualified for free shipping.
    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping == Money::ZERO
    }
}

/// Store-wide pricing constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Flat sales tax rate applied to the subtotal.
    pub tax_rate: Decimal,
    /// Subtotals strictly above this ship free.
    pub free_shipping_threshold: Money,
    /// Shipping charged at or below the threshold.
    pub flat_shipping: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            free_shipping_threshold: Money::from_cents(5000),
            flat_shipping: Money::from_cents(999),
        }
    }
}

impl PricingPolicy {
    /// Compute totals for `items`.
    #[must_use]
    pub fn totals(&self, items: &[LineItem]) -> CartTotals {
        let subtotal = items
            .iter()
            .map(LineItem::line_total)
            .sum::<Money>()
            .round_cents();
        let item_count = items.iter().map(|item| item.quantity.get()).sum();
        let tax = subtotal.scale(self.tax_rate).round_cents();
        let shipping = self.shipping_for(subtotal);
        let total = (subtotal + tax + shipping).round_cents();

        CartTotals {
            subtotal,
            tax,
            shipping,
            total,
            item_count,
        }
    }

    /// Shipping charged for a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal > self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_shipping
        }
    }
}

/// Compute totals for `items` with the default [`PricingPolicy`].
#[must_use]
pub fn calculate_totals(items: &[LineItem]) -> CartTotals {
    PricingPolicy::default().totals(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::cart::Cart;
    use crate::types::{Inventory, ProductId, ProductSnapshot, ProductStatus, Quantity};

    fn product(id: &str, cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            price: Money::from_cents(cents),
            original_price: None,
            inventory: Inventory::Untracked,
            status: ProductStatus::Active,
            image: None,
        }
    }

    fn add(cart: &mut Cart, id: &str, cents: i64, quantity: u32) {
        cart.add(
            product(id, cents),
            Quantity::new(quantity).unwrap(),
            None,
            Utc::now(),
        )
        .unwrap();
    }

    #[test]
    fn test_two_twenty_dollar_items() {
        let mut cart = Cart::new();
        add(&mut cart, "a", 2000, 2);

        let totals = calculate_totals(cart.items());
        assert_eq!(totals.subtotal, Money::from_cents(4000));
        assert_eq!(totals.tax, Money::from_cents(320));
        assert_eq!(totals.shipping, Money::from_cents(999));
        assert_eq!(totals.total, Money::from_cents(5319));
        assert_eq!(totals.item_count, 2);
    }

    #[test]
    fn test_crossing_free_shipping_threshold() {
        let mut cart = Cart::new();
        add(&mut cart, "a", 2000, 2);
        add(&mut cart, "b", 1500, 1);

        let totals = calculate_totals(cart.items());
        assert_eq!(totals.subtotal, Money::from_cents(5500));
        assert_eq!(totals.tax, Money::from_cents(440));
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, Money::from_cents(5940));
        assert!(totals.ships_free());
    }

    #[test]
    fn test_free_shipping_boundary() {
        let mut at = Cart::new();
        add(&mut at, "a", 5000, 1);
        assert_eq!(
            calculate_totals(at.items()).shipping,
            Money::from_cents(999)
        );

        let mut above = Cart::new();
        add(&mut above, "a", 5001, 1);
        assert_eq!(calculate_totals(above.items()).shipping, Money::ZERO);
    }

    #[test]
    fn test_empty_cart() {
        let totals = calculate_totals(&[]);
        assert_eq!(totals.subtotal, Money::ZERO);
        assert_eq!(totals.tax, Money::ZERO);
        assert_eq!(totals.shipping, Money::from_cents(999));
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let mut cart = Cart::new();
        add(&mut cart, "a", 1056, 1);
        // 10.56 * 0.08 = 0.8448
        assert_eq!(calculate_totals(cart.items()).tax, Money::from_cents(84));

        let mut cart = Cart::new();
        add(&mut cart, "b", 319, 1);
        // 3.19 * 0.08 = 0.2552
        assert_eq!(calculate_totals(cart.items()).tax, Money::from_cents(26));
    }

    #[test]
    fn test_totals_are_idempotent() {
        let mut cart = Cart::new();
        add(&mut cart, "a", 1999, 3);
        add(&mut cart, "b", 2, 7);
        let first = calculate_totals(cart.items());
        let second = calculate_totals(cart.items());
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            tax_rate: Decimal::ZERO,
            free_shipping_threshold: Money::from_cents(10_000),
            flat_shipping: Money::from_cents(500),
        };
        let mut cart = Cart::new();
        add(&mut cart, "a", 6000, 1);
        let totals = policy.totals(cart.items());
        assert_eq!(totals.tax, Money::ZERO);
        assert_eq!(totals.shipping, Money::from_cents(500));
        assert_eq!(totals.total, Money::from_cents(6500));
    }
}
