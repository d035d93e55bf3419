//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Readiness check (database)
//!
//! # Catalog
//! GET    /api/products/{id}             - Product snapshot
//!
//! # Account cart (requires bearer token)
//! GET    /api/auth/cart                 - Current cart
//! POST   /api/auth/cart                 - Add item
//! DELETE /api/auth/cart/{product_id}    - Remove item (?variant=Name:Value,...)
//! ```
//!
//! Every cart response is `{"items": [...], "totals": {...}}` holding the
//! account's full cart after the operation.

pub mod cart;
pub mod products;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(products::show))
}

/// Create the account cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{product_id}", axum::routing::delete(cart::remove))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/auth/cart", cart_routes())
}

/// Build the complete application router with tracing and request IDs.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    account_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.repositories().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
