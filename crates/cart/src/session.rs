//! Switching the cart between device and account storage.
//!
//! A [`CartSession`] owns the active [`CartStore`] and rebuilds it at each
//! authentication transition, which is the only point where the persistence
//! adapter changes:
//!
//! - **login**: the guest cart (if any) is merged into the account cart, local
//!   storage is cleared, and the store reloads from the account
//! - **logout**: the store reloads from local storage
//!
//! Between transitions every operation goes through the adapter chosen here.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::auth::AuthState;
use crate::catalog::{CatalogStore, HttpCatalog};
use crate::config::CartClientConfig;
use crate::error::Result;
use crate::merge::{MergeReport, merge_guest_cart};
use crate::persistence::{LocalCartAdapter, RemoteCartAdapter};
use crate::remote::{HttpConnector, RemoteCartService, RemoteConnector};
use crate::store::CartStore;

/// What a call to [`CartSession::handle_auth_change`] did.
#[derive(Debug)]
pub enum AuthTransition {
    /// Now signed in. `merge` is set when a non-empty guest cart was merged.
    LoggedIn {
        /// Outcome of the guest cart merge.
        merge: Option<MergeReport>,
        /// Whether the guest cart file was removed. When `false` the file
        /// could not be deleted and may reappear after logout.
        local_cleared: bool,
    },
    /// Now a guest.
    LoggedOut,
    /// The state did not change.
    Unchanged,
}

/// The shopper's cart across login and logout.
pub struct CartSession {
    store: CartStore,
    state: AuthState,
    catalog: Arc<dyn CatalogStore>,
    local: Arc<LocalCartAdapter>,
    connector: Arc<dyn RemoteConnector>,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("state", &self.state)
            .field("store", &self.store)
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Open a session in `state`, loading the matching cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded.
    #[instrument(skip_all, fields(authenticated = state.is_authenticated()))]
    pub async fn open(
        catalog: Arc<dyn CatalogStore>,
        local: LocalCartAdapter,
        connector: Arc<dyn RemoteConnector>,
        state: AuthState,
    ) -> Result<Self> {
        let local = Arc::new(local);
        let store = match state.session() {
            None => CartStore::open(catalog.clone(), local.clone()).await?,
            Some(session) => {
                let adapter = RemoteCartAdapter::new(connector.connect(session));
                CartStore::open(catalog.clone(), Arc::new(adapter)).await?
            }
        };
        Ok(Self {
            store,
            state,
            catalog,
            local,
            connector,
        })
    }

    /// Open a session against the MarketHub API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded.
    pub async fn connect(config: &CartClientConfig, state: AuthState) -> Result<Self> {
        let client = reqwest::Client::new();
        let catalog = Arc::new(HttpCatalog::new(client.clone(), config.api_url.clone()));
        let connector = Arc::new(HttpConnector::new(client, config.api_url.clone()));
        Self::open(
            catalog,
            LocalCartAdapter::new(&config.cart_dir),
            connector,
            state,
        )
        .await
    }

    /// The active cart store.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// The active cart store, for mutations.
    pub fn store_mut(&mut self) -> &mut CartStore {
        &mut self.store
    }

    /// The authentication state the store was built for.
    #[must_use]
    pub const fn auth_state(&self) -> &AuthState {
        &self.state
    }

    /// Rebuild the store for `next`.
    ///
    /// On login from guest, a non-empty guest cart is merged into the account
    /// cart first. The in-memory guest cart is then emptied and local storage
    /// cleared whatever the merge outcome, so a retried login never submits
    /// the same guest lines twice. A failure to delete the local file is
    /// logged and reported through `local_cleared`; it does not stop the login.
    ///
    /// # Errors
    ///
    /// Returns an error if the new cart cannot be loaded. The session keeps
    /// its previous authentication state in that case, with an empty guest
    /// cart if a merge already ran.
    #[instrument(skip_all, fields(authenticated = next.is_authenticated()))]
    pub async fn handle_auth_change(&mut self, next: AuthState) -> Result<AuthTransition> {
        if next == self.state {
            return Ok(AuthTransition::Unchanged);
        }

        let Some(session) = next.session() else {
            self.store = CartStore::open(self.catalog.clone(), self.local.clone()).await?;
            self.state = next;
            info!("cart switched to device storage");
            return Ok(AuthTransition::LoggedOut);
        };

        let remote = self.connector.connect(session);
        let (merge, local_cleared) = if self.state.is_authenticated() {
            (None, true)
        } else {
            self.absorb_guest_cart(remote.as_ref()).await
        };

        let adapter = Arc::new(RemoteCartAdapter::new(remote));
        self.store = CartStore::open(self.catalog.clone(), adapter).await?;
        info!(account_id = %session.account_id, lines = self.store.items().len(), "cart switched to account storage");
        self.state = next;
        Ok(AuthTransition::LoggedIn {
            merge,
            local_cleared,
        })
    }

    /// Apply every transition published on `updates` until the provider is
    /// dropped.
    ///
    /// Failed transitions are logged and the session keeps following.
    pub async fn follow(&mut self, mut updates: watch::Receiver<AuthState>) {
        while updates.changed().await.is_ok() {
            let next = updates.borrow_and_update().clone();
            match self.handle_auth_change(next).await {
                Ok(AuthTransition::LoggedIn {
                    merge: Some(report),
                    ..
                }) if !report.is_complete() => {
                    warn!(
                        merged = report.merged,
                        failed = report.failures.len(),
                        "guest cart only partly merged"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "failed to switch cart storage"),
            }
        }
    }

    /// Merge the guest cart into `remote`, then empty it locally.
    ///
    /// Returns the merge report and whether the local file was removed.
    async fn absorb_guest_cart(
        &mut self,
        remote: &dyn RemoteCartService,
    ) -> (Option<MergeReport>, bool) {
        let guest_items = self.store.items().to_vec();
        let report = if guest_items.is_empty() {
            None
        } else {
            Some(merge_guest_cart(&guest_items, remote).await)
        };

        // The guest lines are spent once the merge has run
        self.store = CartStore::with_items(self.catalog.clone(), self.local.clone(), Vec::new());
        let cleared = match self.local.clear_storage().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, path = %self.local.path().display(), "failed to clear local cart after merge");
                false
            }
        };
        (report, cleared)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use markethub_core::{AccountId, ProductId};
    use tempfile::TempDir;

    use super::*;
    use crate::auth::{AccountSession, AuthStateProvider};
    use crate::catalog::InMemoryCatalog;
    use crate::persistence::{AdapterKind, CartPersistence};
    use crate::test_support::{FakeConnector, FakeRemote, product};

    fn alice() -> AuthState {
        AuthState::Authenticated(AccountSession::new(
            AccountId::new("acct-alice"),
            "tok-alice".to_string(),
        ))
    }

    async fn guest_session(remote: FakeRemote) -> (TempDir, Arc<FakeRemote>, CartSession) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(InMemoryCatalog::new([product("a", 2000), product("b", 1500)]));
        let remote = Arc::new(remote);
        let session = CartSession::open(
            catalog,
            LocalCartAdapter::new(dir.path()),
            Arc::new(FakeConnector(remote.clone())),
            AuthState::Guest,
        )
        .await
        .unwrap();
        (dir, remote, session)
    }

    fn account() -> FakeRemote {
        FakeRemote::new([product("a", 2000), product("b", 1500)])
    }

    #[tokio::test]
    async fn test_login_merges_guest_cart() {
        let (dir, remote, mut session) = guest_session(account().with_line("a", 3)).await;
        let store = session.store_mut();
        store.add_item(&ProductId::new("a"), 1, None).await.unwrap();
        store.add_item(&ProductId::new("b"), 2, None).await.unwrap();

        let transition = session.handle_auth_change(alice()).await.unwrap();

        let AuthTransition::LoggedIn {
            merge: Some(report),
            local_cleared,
        } = transition
        else {
            panic!("expected a merge");
        };
        assert!(report.is_complete());
        assert!(local_cleared);
        assert_eq!(remote.quantity_of("a"), 4);
        assert_eq!(remote.quantity_of("b"), 2);

        assert_eq!(session.store().adapter_kind(), AdapterKind::Remote);
        assert_eq!(session.store().item_quantity(&ProductId::new("a")), 4);
        assert_eq!(session.store().item_quantity(&ProductId::new("b")), 2);

        let local = LocalCartAdapter::new(dir.path());
        assert!(local.load().await.unwrap().is_empty());
        assert!(!local.path().exists());
    }

    #[tokio::test]
    async fn test_login_with_empty_guest_cart_skips_merge() {
        let (_dir, remote, mut session) = guest_session(account().with_line("a", 3)).await;

        let transition = session.handle_auth_change(alice()).await.unwrap();

        assert!(matches!(
            transition,
            AuthTransition::LoggedIn {
                merge: None,
                local_cleared: true
            }
        ));
        assert_eq!(remote.calls(), vec!["fetch"]);
        assert_eq!(session.store().item_quantity(&ProductId::new("a")), 3);
    }

    #[tokio::test]
    async fn test_partial_merge_still_clears_local() {
        let (dir, remote, mut session) = guest_session(account()).await;
        let store = session.store_mut();
        store.add_item(&ProductId::new("a"), 1, None).await.unwrap();
        store.add_item(&ProductId::new("b"), 1, None).await.unwrap();
        remote.fail_on("a");

        let transition = session.handle_auth_change(alice()).await.unwrap();

        let AuthTransition::LoggedIn {
            merge: Some(report),
            ..
        } = transition
        else {
            panic!("expected a merge");
        };
        assert!(report.is_partial());
        assert_eq!(remote.quantity_of("b"), 1);
        assert!(LocalCartAdapter::new(dir.path()).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_survives_undeletable_local_cart() {
        let (dir, remote, mut session) = guest_session(account().with_line("a", 3)).await;
        session
            .store_mut()
            .add_item(&ProductId::new("a"), 1, None)
            .await
            .unwrap();

        // A directory in place of the cart file makes the delete fail
        let path = LocalCartAdapter::new(dir.path()).path().to_path_buf();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let transition = session.handle_auth_change(alice()).await.unwrap();

        let AuthTransition::LoggedIn {
            merge: Some(report),
            local_cleared,
        } = transition
        else {
            panic!("expected a merge");
        };
        assert!(report.is_complete());
        assert!(!local_cleared);
        assert!(session.auth_state().is_authenticated());
        assert_eq!(remote.quantity_of("a"), 4);

        assert!(matches!(
            session.handle_auth_change(alice()).await.unwrap(),
            AuthTransition::Unchanged
        ));
        assert_eq!(remote.quantity_of("a"), 4);
        assert_eq!(session.store().item_quantity(&ProductId::new("a")), 4);
    }

    #[tokio::test]
    async fn test_logout_returns_to_device_storage() {
        let (_dir, _remote, mut session) = guest_session(account().with_line("a", 3)).await;
        session.handle_auth_change(alice()).await.unwrap();

        let transition = session.handle_auth_change(AuthState::Guest).await.unwrap();

        assert!(matches!(transition, AuthTransition::LoggedOut));
        assert_eq!(session.store().adapter_kind(), AdapterKind::Local);
        assert!(session.store().items().is_empty());
        assert!(matches!(
            session.handle_auth_change(AuthState::Guest).await.unwrap(),
            AuthTransition::Unchanged
        ));
    }

    #[tokio::test]
    async fn test_follow_applies_published_transitions() {
        let (_dir, remote, mut session) = guest_session(account().with_line("b", 1)).await;
        session
            .store_mut()
            .add_item(&ProductId::new("a"), 2, None)
            .await
            .unwrap();

        let provider = AuthStateProvider::default();
        let updates = provider.subscribe();
        if let AuthState::Authenticated(account) = alice() {
            provider.log_in(account);
        }
        drop(provider);

        session.follow(updates).await;

        assert!(session.auth_state().is_authenticated());
        assert_eq!(remote.quantity_of("a"), 2);
        assert_eq!(session.store().items().len(), 2);
    }
}
