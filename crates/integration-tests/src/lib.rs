//! Integration tests for MarketHub.
//!
//! Each test starts the API on an ephemeral port over an in-memory store and
//! drives it with the real HTTP cart client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p markethub-integration-tests
//! ```

use std::error::Error;
use std::sync::Arc;

use markethub_api::db::{InMemoryStore, Repositories};
use markethub_api::{AppState, router};
use markethub_cart::{
    AccountSession, HttpCartService, HttpCatalog, HttpConnector, RemoteCartService,
};
use markethub_core::{AccountId, Inventory, Money, ProductId, ProductSnapshot, ProductStatus};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// A running API server.
pub struct TestServer {
    /// Base URL, e.g. `http://127.0.0.1:54321/`.
    pub base_url: Url,
    /// The store behind the server.
    pub store: Arc<InMemoryStore>,
    /// HTTP client shared by the helpers.
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    /// Start a server seeded with `products`.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start(products: Vec<ProductSnapshot>) -> Result<Self, Box<dyn Error>> {
        let store = Arc::new(InMemoryStore::with_products(products));
        let app = router(AppState::new(Repositories::in_memory(store.clone())));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = Url::parse(&format!("http://{}/", listener.local_addr()?))?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "test server stopped");
            }
        });

        Ok(Self {
            base_url,
            store,
            client: reqwest::Client::new(),
            handle,
        })
    }

    /// Register `token` for `account` and return the client-side session.
    pub async fn sign_in(&self, account: &str, token: &str) -> AccountSession {
        let account = AccountId::new(account);
        self.store.insert_session(token, account.clone()).await;
        AccountSession::new(account, token.to_string())
    }

    /// Catalog client for this server.
    #[must_use]
    pub fn catalog(&self) -> Arc<HttpCatalog> {
        Arc::new(HttpCatalog::new(self.client.clone(), self.base_url.clone()))
    }

    /// Connector for this server.
    #[must_use]
    pub fn connector(&self) -> Arc<HttpConnector> {
        Arc::new(HttpConnector::new(self.client.clone(), self.base_url.clone()))
    }

    /// Account cart client using `token`.
    #[must_use]
    pub fn cart_service(&self, token: &str) -> Arc<dyn RemoteCartService> {
        Arc::new(HttpCartService::new(
            self.client.clone(),
            self.base_url.clone(),
            SecretString::from(token.to_string()),
        ))
    }
}

/// An active product with untracked stock.
#[must_use]
pub fn product(id: &str, cents: i64) -> ProductSnapshot {
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

/// An active product with `available` units in stock.
#[must_use]
pub fn tracked(id: &str, cents: i64, available: u32) -> ProductSnapshot {
    ProductSnapshot {
        inventory: Inventory::Tracked { available },
        ..product(id, cents)
    }
}
