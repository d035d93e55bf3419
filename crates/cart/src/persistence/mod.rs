//! Where a cart's items live between operations.
//!
//! One interface, two implementations, chosen once per authentication state:
//!
//! | Adapter               | Owner   | Storage                               |
//! |-----------------------|---------|---------------------------------------|
//! | [`LocalCartAdapter`]  | guest   | JSON file on this device              |
//! | [`RemoteCartAdapter`] | account | account cart service, one call per op |
//!
//! The store computes a candidate cart, hands the mutation to the adapter and
//! adopts whatever items the adapter returns. If the adapter fails, the
//! store's cart is left as it was.

mod local;
mod remote;

use async_trait::async_trait;
use markethub_core::{Cart, LineItem, LineKey, ProductId, Quantity, VariantSelection};

pub use local::{LocalCartAdapter, STORAGE_KEY};
pub use remote::RemoteCartAdapter;

use crate::error::PersistenceError;

/// Which backend an adapter writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Device-local storage.
    Local,
    /// Account cart service.
    Remote,
}

/// A change the store asks an adapter to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMutation {
    /// Add units, incrementing an existing line with the same key.
    Add {
        /// Product to add.
        product_id: ProductId,
        /// Units to add.
        quantity: Quantity,
        /// Selected options.
        variant: Option<VariantSelection>,
    },
    /// Replace a line's quantity.
    SetQuantity {
        /// Line to change.
        key: LineKey,
        /// New quantity.
        quantity: Quantity,
        /// Quantity the store held before the change.
        previous: Quantity,
    },
    /// Delete lines.
    Remove {
        /// Lines to delete, one per variant of a product or a single line.
        keys: Vec<LineKey>,
    },
    /// Delete every line.
    Clear,
}

impl CartMutation {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::SetQuantity { .. } => "set_quantity",
            Self::Remove { .. } => "remove",
            Self::Clear => "clear",
        }
    }
}

/// Storage backend for one owner's cart.
#[async_trait]
pub trait CartPersistence: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> AdapterKind;

    /// Read the stored items.
    async fn load(&self) -> Result<Vec<LineItem>, PersistenceError>;

    /// Persist `mutation` and return the authoritative items afterwards.
    ///
    /// `candidate` is the cart as the store expects it to look once the
    /// mutation is applied. Adapters that own the data (local storage) write
    /// it as-is; adapters backed by a service replay the mutation remotely
    /// and return the service's answer instead.
    async fn apply(
        &self,
        mutation: &CartMutation,
        candidate: &Cart,
    ) -> Result<Vec<LineItem>, PersistenceError>;
}
