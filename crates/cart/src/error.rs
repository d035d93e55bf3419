//! Error types for the cart engine.
//!
//! Every [`CartStore`](crate::store::CartStore) operation returns
//! `Result<T, CartError>`. Expected conditions (out of stock, item not found)
//! are ordinary `Err` values with a stable [`CartError::reason`] code; they are
//! never panics.

use markethub_core::{CartRuleError, LineKey};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::remote::RemoteError;

/// A cart could not be read from or written to its backing storage.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Local storage could not be read or written.
    #[error("cart storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Items could not be serialized for local storage.
    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),

    /// The account cart service call failed.
    #[error("remote cart error: {0}")]
    Remote(#[from] RemoteError),

    /// A quantity change removed the account line, the new quantity was
    /// rejected, and the old one could not be put back.
    #[error("line {key} was dropped from the account cart: {source}")]
    LineDropped {
        /// Line that is no longer in the account cart.
        key: LineKey,
        /// Why the line could not be restored.
        source: RemoteError,
    },
}

/// Broad category of a [`CartError`], used to decide how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was malformed (bad quantity, missing product, unknown line).
    Validation,
    /// The product cannot be sold in the requested amount.
    Availability,
    /// Storage or the remote service failed; the cart was not changed.
    Persistence,
    /// A collaborator failed in an unexpected way.
    Internal,
}

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation broke a cart rule.
    #[error(transparent)]
    Rule(#[from] CartRuleError),

    /// The adapter failed to persist the change.
    #[error("cart persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// The catalog could not be reached.
    #[error("catalog error: {0}")]
    Catalog(CatalogError),

    /// An order was requested for an empty cart.
    #[error("cart is empty")]
    EmptyCart,
}

impl From<RemoteError> for CartError {
    fn from(err: RemoteError) -> Self {
        Self::Persistence(PersistenceError::Remote(err))
    }
}

impl CartError {
    /// The error's category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Rule(rule) if rule.is_availability() => ErrorKind::Availability,
            Self::Rule(_) | Self::EmptyCart => ErrorKind::Validation,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Catalog(CatalogError::NotFound(_)) => ErrorKind::Availability,
            Self::Catalog(CatalogError::Unavailable(_)) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for the failure.
    ///
    /// Rule violations reported by the account cart service keep the
    /// service's code, so a remote "insufficient stock" reads the same as a
    /// local one.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Rule(rule) => rule.reason(),
            Self::Persistence(PersistenceError::Remote(RemoteError::Rejected {
                reason: Some(reason),
                ..
            })) => reason,
            Self::Persistence(PersistenceError::LineDropped { .. }) => "line_dropped",
            Self::Persistence(_) => "persistence_failed",
            Self::Catalog(CatalogError::NotFound(_)) => "product_unavailable",
            Self::Catalog(CatalogError::Unavailable(_)) => "catalog_unavailable",
            Self::EmptyCart => "empty_cart",
        }
    }
}

/// Result type alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;
