//! MarketHub API library.
//!
//! Serves the product catalog and account carts that the cart client reads
//! and writes once a shopper is signed in. Exposed as a library so the
//! router can be exercised in tests without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use routes::router;
pub use state::AppState;
