//! MarketHub Core - Shared cart types and pricing rules.
//!
//! This crate provides the domain shared by every MarketHub component:
//! - `cart` - Client-side cart engine (guest and account carts)
//! - `api` - Account cart service and product catalog
//! - `cli` - Command-line tools for migrations and cart inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. The same [`Cart`] rules run on the client before a
//! mutation is persisted and on the service when it applies a remote add.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, quantities, and product snapshots
//! - [`cart`] - Line items and the in-memory cart with its invariants
//! - [`pricing`] - Subtotal, tax, shipping, and total computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartRuleError, LineItem, LineKey};
pub use pricing::{CartTotals, PricingPolicy, calculate_totals};
pub use types::*;
