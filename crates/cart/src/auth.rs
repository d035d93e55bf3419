//! Authentication state seen by the cart.
//!
//! Token issuance happens elsewhere; the cart only needs to know whether a
//! shopper is signed in, as which account, and with which bearer token.
//! [`AuthStateProvider`] broadcasts transitions so a
//! [`CartSession`](crate::session::CartSession) can switch adapters at exactly
//! the login/logout boundary.

use markethub_core::AccountId;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::info;

/// A signed-in account and the token that proves it.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct AccountSession {
    /// The signed-in account.
    pub account_id: AccountId,
    /// Bearer token presented to the account cart service.
    pub token: SecretString,
}

impl AccountSession {
    /// Create a session for `account_id`.
    #[must_use]
    pub fn new(account_id: AccountId, token: impl Into<SecretString>) -> Self {
        Self {
            account_id,
            token: token.into(),
        }
    }
}

impl PartialEq for AccountSession {
    fn eq(&self, other: &Self) -> bool {
        self.account_id == other.account_id
            && self.token.expose_secret() == other.token.expose_secret()
    }
}

impl Eq for AccountSession {}

impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession")
            .field("account_id", &self.account_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Whether the shopper is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Anonymous; the cart lives on this device.
    #[default]
    Guest,
    /// Signed in; the cart lives on the account.
    Authenticated(AccountSession),
}

impl AuthState {
    /// The account session, if signed in.
    #[must_use]
    pub const fn session(&self) -> Option<&AccountSession> {
        match self {
            Self::Guest => None,
            Self::Authenticated(session) => Some(session),
        }
    }

    /// Whether the shopper is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Publishes authentication transitions to subscribers.
#[derive(Debug)]
pub struct AuthStateProvider {
    sender: watch::Sender<AuthState>,
}

impl Default for AuthStateProvider {
    fn default() -> Self {
        Self::new(AuthState::Guest)
    }
}

impl AuthStateProvider {
    /// Create a provider starting in `initial`.
    #[must_use]
    pub fn new(initial: AuthState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// A receiver that observes every future transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }

    /// Record a successful login.
    pub fn log_in(&self, session: AccountSession) {
        info!(account_id = %session.account_id, "signed in");
        self.set(AuthState::Authenticated(session));
    }

    /// Record a logout.
    pub fn log_out(&self) {
        info!("signed out");
        self.set(AuthState::Guest);
    }

    fn set(&self, state: AuthState) {
        // Subscribers are only notified on an actual change.
        self.sender.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
