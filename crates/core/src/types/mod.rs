//! Core types for MarketHub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod product;
pub mod quantity;
pub mod status;
pub mod variant;

pub use id::*;
pub use money::Money;
pub use product::{Inventory, ProductSnapshot};
pub use quantity::{Quantity, QuantityError};
pub use status::ProductStatus;
pub use variant::{VariantError, VariantSelection};
