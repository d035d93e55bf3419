//! MarketHub Cart - client cart engine.
//!
//! Keeps a shopper's cart consistent across device-local storage (guest) and
//! the account cart service (signed in), and merges the two at login.
//!
//! # Architecture
//!
//! ```text
//! caller -> CartStore -> CartPersistence (local file | remote service)
//!              |
//!              +-> CatalogStore (price, status, stock at add time)
//!              +-> PricingPolicy (totals, derived on read)
//!
//! AuthStateProvider --watch--> CartSession --login--> merge_guest_cart
//! ```
//!
//! # Modules
//!
//! - [`store`] - The cart store and its operations
//! - [`persistence`] - Local and remote persistence adapters
//! - [`merge`] - Guest-to-account merge at login
//! - [`session`] - Adapter switching on authentication transitions
//! - [`auth`] - Authentication state and its provider
//! - [`catalog`] - Product lookups
//! - [`remote`] - Account cart service client
//! - [`config`] - Environment configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod merge;
pub mod persistence;
pub mod remote;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use auth::{AccountSession, AuthState, AuthStateProvider};
pub use catalog::{CatalogError, CatalogStore, HttpCatalog, InMemoryCatalog};
pub use config::CartClientConfig;
pub use error::{CartError, ErrorKind, PersistenceError};
pub use merge::{MergeFailure, MergeReport, merge_guest_cart};
pub use persistence::{AdapterKind, CartMutation, CartPersistence, LocalCartAdapter, RemoteCartAdapter};
pub use remote::{HttpCartService, HttpConnector, RemoteCartService, RemoteConnector, RemoteError};
pub use session::{AuthTransition, CartSession};
pub use store::{CartStore, DriftKind, OrderDraft, SnapshotDrift};
