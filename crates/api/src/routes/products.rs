//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use markethub_core::{ProductId, ProductSnapshot};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product snapshot by ID.
///
/// Inactive and draft products are still returned; whether they can be
/// bought is decided when they are added to a cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductSnapshot>> {
    let id = ProductId::new(id);
    state
        .products()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
