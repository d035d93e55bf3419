//! Account cart route handlers.
//!
//! Each handler loads the account's cart, applies one change with the same
//! rules the client enforces, saves it, and answers with the whole cart.
//! Stock and status are checked against the live catalog record, not the
//! snapshot stored on the line.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use markethub_core::{
    AccountId, Cart, CartRuleError, CartTotals, LineItem, LineKey, ProductId, Quantity,
    VariantSelection,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAccount;
use crate::state::AppState;

/// Body of `POST /api/auth/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    /// Product to add.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Units to add (default 1).
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Selected options.
    #[serde(default)]
    pub variant: Option<VariantSelection>,
}

/// Query string of `DELETE /api/auth/cart/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    /// Variant in `Name:Value,Name:Value` form.
    pub variant: Option<String>,
}

/// Body of every cart response.
#[derive(Debug, Serialize)]
pub struct CartBody {
    /// The account's line items.
    pub items: Vec<LineItem>,
    /// Figures derived from `items`.
    pub totals: CartTotals,
}

fn cart_body(state: &AppState, cart: Cart) -> Json<CartBody> {
    let totals = state.pricing().totals(cart.items());
    Json(CartBody {
        items: cart.into_items(),
        totals,
    })
}

async fn load_cart(state: &AppState, account: &AccountId) -> Result<Cart> {
    Ok(Cart::from_items(state.carts().load(account).await?))
}

/// Current cart.
#[instrument(skip_all, fields(account_id = %account))]
pub async fn show(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<CartBody>> {
    let cart = load_cart(&state, &account).await?;
    Ok(cart_body(&state, cart))
}

/// Add an item, merging into an existing line with the same variant.
#[instrument(skip_all, fields(account_id = %account))]
pub async fn add(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(body): Json<AddItemBody>,
) -> Result<Json<CartBody>> {
    let product_id = body
        .product_id
        .filter(|id| !id.is_blank())
        .ok_or(CartRuleError::MissingProductId)?;
    let quantity =
        Quantity::try_from_signed(body.quantity.unwrap_or(1)).map_err(CartRuleError::from)?;

    let product = state
        .products()
        .get(&product_id)
        .await?
        .ok_or_else(|| CartRuleError::ProductUnavailable(product_id.clone()))?;

    let mut cart = load_cart(&state, &account).await?;
    let line_quantity = cart.add(
        product,
        quantity,
        VariantSelection::normalize(body.variant),
        Utc::now(),
    )?;
    state.carts().save(&account, cart.items()).await?;

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("product_id", product_id.as_str())]),
    );
    tracing::info!(
        product_id = %product_id,
        quantity = quantity.get(),
        line_quantity = line_quantity.get(),
        "item added to account cart"
    );
    Ok(cart_body(&state, cart))
}

/// Remove one line.
#[instrument(skip_all, fields(account_id = %account, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Path(product_id): Path<String>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<CartBody>> {
    let variant = params
        .variant
        .map(|text| text.parse::<VariantSelection>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let key = LineKey::new(
        ProductId::new(product_id),
        VariantSelection::normalize(variant),
    );

    let mut cart = load_cart(&state, &account).await?;
    cart.remove(&key)?;
    state.carts().save(&account, cart.items()).await?;

    tracing::info!(line = %key, "item removed from account cart");
    Ok(cart_body(&state, cart))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
    };
    use markethub_core::Inventory;
    use serde_json::json;

    use super::super::test_support::{TOKEN, app, product, send};

    fn get_cart() -> Request<Body> {
        Request::get("/api/auth/cart")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap()
    }

    fn post_cart(body: &serde_json::Value) -> Request<Body> {
        Request::post("/api/auth/cart")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete_cart(path: &str) -> Request<Body> {
        Request::delete(format!("/api/auth/cart/{path}"))
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn catalog_app() -> Router {
        let (app, _) = app(vec![
            product("lamp", 2000, Inventory::Tracked { available: 3 }),
            product("mug", 1500, Inventory::Untracked),
            product("sold-out", 900, Inventory::Tracked { available: 0 }),
        ])
        .await;
        app
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let app = catalog_app().await;
        let (status, body) = send(
            &app,
            Request::get("/api/auth/cart").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, 401);
        assert_eq!(body["reason"], "unauthorized");

        let (status, _) = send(
            &app,
            Request::get("/api/auth/cart")
                .header(header::AUTHORIZATION, "Bearer nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn test_new_account_has_empty_cart() {
        let app = catalog_app().await;
        let (status, body) = send(&app, get_cart()).await;
        assert_eq!(status, 200);
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["totals"]["shipping"], "9.99");
    }

    #[tokio::test]
    async fn test_add_merges_lines_and_persists() {
        let app = catalog_app().await;
        let (status, _) = send(&app, post_cart(&json!({"productId": "lamp", "quantity": 2}))).await;
        assert_eq!(status, 200);
        let (status, body) = send(&app, post_cart(&json!({"productId": "lamp"}))).await;
        assert_eq!(status, 200);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["quantity"], 3);

        let (_, body) = send(&app, get_cart()).await;
        assert_eq!(body["items"][0]["quantity"], 3);
        assert_eq!(body["totals"]["subtotal"], "60.00");
        assert_eq!(body["totals"]["tax"], "4.80");
        assert_eq!(body["totals"]["shipping"], "0");
        assert_eq!(body["totals"]["itemCount"], 3);
    }

    #[tokio::test]
    async fn test_add_rejections() {
        let app = catalog_app().await;
        send(&app, post_cart(&json!({"productId": "lamp", "quantity": 2}))).await;

        let cases = [
            (json!({"productId": "lamp", "quantity": 2}), 409, "insufficient_stock"),
            (json!({"productId": "sold-out"}), 409, "out_of_stock"),
            (json!({"productId": "ghost"}), 409, "product_unavailable"),
            (json!({"productId": "mug", "quantity": 0}), 400, "invalid_quantity"),
            (json!({"productId": "mug", "quantity": -3}), 400, "invalid_quantity"),
            (json!({"productId": "mug", "quantity": 10_001}), 400, "invalid_quantity"),
            (json!({"productId": "  "}), 400, "missing_product_id"),
            (json!({"quantity": 1}), 400, "missing_product_id"),
        ];
        for (request, expected_status, expected_reason) in cases {
            let (status, body) = send(&app, post_cart(&request)).await;
            assert_eq!(status, expected_status, "{request}");
            assert_eq!(body["reason"], expected_reason, "{request}");
        }

        let (_, body) = send(&app, get_cart()).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["quantity"], 2);
    }

    #[tokio::test]
    async fn test_variants_are_separate_lines() {
        let app = catalog_app().await;
        send(&app, post_cart(&json!({"productId": "mug", "variant": {"Color": "Red"}}))).await;
        send(&app, post_cart(&json!({"productId": "mug", "variant": {"Color": "Blue"}}))).await;
        let (_, body) = send(&app, post_cart(&json!({"productId": "mug"}))).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 3);

        let (status, body) = send(&app, delete_cart("mug?variant=Color:Red")).await;
        assert_eq!(status, 200);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item["variant"] != json!({"Color": "Red"})));
    }

    #[tokio::test]
    async fn test_add_rejects_unparseable_variant() {
        let app = catalog_app().await;
        let (status, _) = send(
            &app,
            post_cart(&json!({"productId": "mug", "variant": {"Size": "M,L"}})),
        )
        .await;
        assert_eq!(status, 422);

        let (_, body) = send(&app, get_cart()).await;
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn test_remove() {
        let app = catalog_app().await;
        send(&app, post_cart(&json!({"productId": "mug"}))).await;

        let (status, body) = send(&app, delete_cart("mug")).await;
        assert_eq!(status, 200);
        assert_eq!(body["items"], json!([]));

        let (status, body) = send(&app, delete_cart("mug")).await;
        assert_eq!(status, 404);
        assert_eq!(body["reason"], "item_not_found");

        let (status, _) = send(&app, delete_cart("mug?variant=Color")).await;
        assert_eq!(status, 400);
    }
}
