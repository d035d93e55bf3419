//! HTTP middleware for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor ([`RequireAccount`]) rather than a layer,
//! so only `/api/auth/*` handlers pay for the token lookup.

pub mod auth;
pub mod request_id;

pub use auth::RequireAccount;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
