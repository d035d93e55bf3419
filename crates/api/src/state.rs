//! Application state shared across handlers.

use std::sync::Arc;

use markethub_core::PricingPolicy;

use crate::db::{CartRepository, ProductRepository, Repositories, SessionRepository};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repositories: Repositories,
    pricing: PricingPolicy,
}

impl AppState {
    /// Create a new application state with the default pricing policy.
    #[must_use]
    pub fn new(repositories: Repositories) -> Self {
        Self::with_pricing(repositories, PricingPolicy::default())
    }

    /// Create a new application state with a custom pricing policy.
    #[must_use]
    pub fn with_pricing(repositories: Repositories, pricing: PricingPolicy) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                repositories,
                pricing,
            }),
        }
    }

    /// All repositories.
    #[must_use]
    pub fn repositories(&self) -> &Repositories {
        &self.inner.repositories
    }

    /// Catalog repository.
    #[must_use]
    pub fn products(&self) -> &dyn ProductRepository {
        self.inner.repositories.products.as_ref()
    }

    /// Account cart repository.
    #[must_use]
    pub fn carts(&self) -> &dyn CartRepository {
        self.inner.repositories.carts.as_ref()
    }

    /// Session repository.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionRepository {
        self.inner.repositories.sessions.as_ref()
    }

    /// Pricing used for cart totals.
    #[must_use]
    pub fn pricing(&self) -> &PricingPolicy {
        &self.inner.pricing
    }
}
