//! Client for the account cart service.
//!
//! When a shopper is signed in, the account cart lives on the server and each
//! cart mutation round-trips to it. Every call returns the full updated cart,
//! which replaces the client's view; the client never trusts its own
//! pre-call state.
//!
//! Calls are not retried and use the transport's default timeouts.

use std::sync::Arc;

use async_trait::async_trait;
use markethub_core::{LineItem, LineKey, ProductId, Quantity, VariantSelection};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::AccountSession;

/// Errors from the account cart service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("cart service rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Machine-readable reason code, when the service sent one.
        reason: Option<String>,
        /// Human-readable message.
        message: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not a cart.
    #[error("invalid cart service response: {0}")]
    Decode(String),
}

/// Operations the account cart service exposes.
///
/// Each operation returns the account's full cart after the change.
#[async_trait]
pub trait RemoteCartService: Send + Sync {
    /// Fetch the account cart.
    async fn fetch(&self) -> Result<Vec<LineItem>, RemoteError>;

    /// Add `quantity` units, incrementing an existing line with the same key.
    async fn add(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        variant: Option<&VariantSelection>,
    ) -> Result<Vec<LineItem>, RemoteError>;

    /// Remove the line with the given key.
    async fn remove(&self, key: &LineKey) -> Result<Vec<LineItem>, RemoteError>;
}

/// Builds a [`RemoteCartService`] for a signed-in account.
pub trait RemoteConnector: Send + Sync {
    /// Connect to the account cart for `session`.
    fn connect(&self, session: &AccountSession) -> Arc<dyn RemoteCartService>;
}

// =============================================================================
// Wire types
// =============================================================================

/// Body of `POST /api/auth/cart`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    /// Product to add.
    pub product_id: ProductId,
    /// Units to add.
    pub quantity: Quantity,
    /// Selected options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantSelection>,
}

/// Body of every successful cart response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartResponse {
    /// The account's line items.
    pub items: Vec<LineItem>,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable reason code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Append path `segments` to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

// =============================================================================
// HttpCartService
// =============================================================================

/// [`RemoteCartService`] over the MarketHub API's `/api/auth/cart` routes.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct HttpCartService {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl std::fmt::Debug for HttpCartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCartService")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl HttpCartService {
    /// Create a client for the API at `base_url`, authenticating with `token`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: Url, token: SecretString) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn cart_url(&self, extra: Option<&str>) -> Result<Url, RemoteError> {
        let mut segments = vec!["api", "auth", "cart"];
        segments.extend(extra);
        endpoint(&self.base_url, &segments)
            .ok_or_else(|| RemoteError::Decode(format!("bad base URL {}", self.base_url)))
    }

    /// Send a request and decode the cart it returns.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<LineItem>, RemoteError> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = response.status();

        // Read the body as text first so error bodies can be reported
        let body = response.text().await?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
            let (message, reason) = match parsed {
                Some(ErrorBody { error, reason }) => (error, reason),
                None => (body, None),
            };
            warn!(status = status.as_u16(), ?reason, %message, "cart service rejected request");
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                reason,
                message,
            });
        }

        let cart: CartResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        debug!(lines = cart.items.len(), "received account cart");
        Ok(cart.items)
    }
}

#[async_trait]
impl RemoteCartService for HttpCartService {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<LineItem>, RemoteError> {
        let url = self.cart_url(None)?;
        self.execute(self.client.get(url)).await
    }

    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity.get()))]
    async fn add(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        variant: Option<&VariantSelection>,
    ) -> Result<Vec<LineItem>, RemoteError> {
        let url = self.cart_url(None)?;
        let body = AddToCartRequest {
            product_id: product_id.clone(),
            quantity,
            variant: variant.cloned(),
        };
        self.execute(self.client.post(url).json(&body)).await
    }

    #[instrument(skip_all, fields(line = %key))]
    async fn remove(&self, key: &LineKey) -> Result<Vec<LineItem>, RemoteError> {
        let mut url = self.cart_url(Some(key.product_id.as_str()))?;
        if let Some(variant) = &key.variant {
            url.query_pairs_mut()
                .append_pair("variant", &variant.to_string());
        }
        self.execute(self.client.delete(url)).await
    }
}

/// Connects account sessions to the API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpConnector {
    /// Create a connector for the API at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

impl RemoteConnector for HttpConnector {
    fn connect(&self, session: &AccountSession) -> Arc<dyn RemoteCartService> {
        Arc::new(HttpCartService::new(
            self.client.clone(),
            self.base_url.clone(),
            session.token.clone(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_and_encodes() {
        let base = Url::parse("http://localhost:5000/").unwrap();
        let url = endpoint(&base, &["api", "products", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/products/a%20b%2Fc");

        let nested = Url::parse("http://localhost:5000/shop").unwrap();
        let url = endpoint(&nested, &["api", "auth", "cart"]).unwrap();
        assert_eq!(url.path(), "/shop/api/auth/cart");
    }

    #[test]
    fn test_endpoint_rejects_cannot_be_a_base() {
        let base = Url::parse("mailto:shop@example.com").unwrap();
        assert!(endpoint(&base, &["api"]).is_none());
    }

    #[test]
    fn test_add_request_wire_format() {
        let body = AddToCartRequest {
            product_id: ProductId::new("lamp"),
            quantity: Quantity::new(2).unwrap(),
            variant: Some(VariantSelection::from_pairs([("Color", "Red")]).unwrap()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["productId"], "lamp");
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["variant"]["Color"], "Red");
    }

    #[test]
    fn test_debug_redacts_token() {
        let service = HttpCartService::new(
            reqwest::Client::new(),
            Url::parse("http://localhost:5000").unwrap(),
            SecretString::from("tok-123"),
        );
        let debug = format!("{service:?}");
        assert!(!debug.contains("tok-123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
