//! Account cart storage through the remote cart service.

use std::sync::Arc;

use async_trait::async_trait;
use markethub_core::{Cart, LineItem, LineKey, Quantity};
use tracing::{debug, error, instrument, warn};

use super::{AdapterKind, CartMutation, CartPersistence};
use crate::error::PersistenceError;
use crate::remote::RemoteCartService;

/// Persists every mutation to the account cart service.
///
/// The service is the source of truth: the candidate cart is ignored and the
/// service's response becomes the store's cart. The service has no update or
/// clear operation, so:
///
/// - `SetQuantity` is a remove followed by an add
/// - `Remove` of several lines and `Clear` are one remove per line
///
/// None of these is atomic. If the add of a `SetQuantity` is rejected, the
/// previous quantity is added back; if that fails too the adapter reports
/// [`PersistenceError::LineDropped`]. For multi-line removes a failure leaves
/// the earlier removes applied on the server, and the store keeps its
/// previous view until the next reload.
#[derive(Clone)]
pub struct RemoteCartAdapter {
    service: Arc<dyn RemoteCartService>,
}

impl std::fmt::Debug for RemoteCartAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCartAdapter").finish_non_exhaustive()
    }
}

impl RemoteCartAdapter {
    /// Wrap a connected cart service.
    #[must_use]
    pub fn new(service: Arc<dyn RemoteCartService>) -> Self {
        Self { service }
    }

    /// Replace a line's quantity by removing it and adding it back.
    async fn replace_line(
        &self,
        key: &LineKey,
        quantity: Quantity,
        previous: Quantity,
    ) -> Result<Vec<LineItem>, PersistenceError> {
        self.service.remove(key).await?;
        let variant = key.variant.as_ref();
        match self.service.add(&key.product_id, quantity, variant).await {
            Ok(items) => Ok(items),
            Err(rejected) => match self.service.add(&key.product_id, previous, variant).await {
                Ok(_) => {
                    warn!(line = %key, error = %rejected, "quantity change rejected, previous quantity restored");
                    Err(rejected.into())
                }
                Err(source) => {
                    error!(line = %key, error = %rejected, restore_error = %source, "quantity change rejected, line dropped");
                    Err(PersistenceError::LineDropped {
                        key: key.clone(),
                        source,
                    })
                }
            },
        }
    }

    /// Remove each of `keys` and return the cart after the last call.
    async fn remove_lines(&self, keys: &[LineKey]) -> Result<Vec<LineItem>, PersistenceError> {
        let mut items = None;
        for key in keys {
            items = Some(self.service.remove(key).await?);
        }
        match items {
            Some(items) => Ok(items),
            None => Ok(self.service.fetch().await?),
        }
    }
}

#[async_trait]
impl CartPersistence for RemoteCartAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Remote
    }

    #[instrument(skip(self))]
    async fn load(&self) -> Result<Vec<LineItem>, PersistenceError> {
        Ok(self.service.fetch().await?)
    }

    #[instrument(skip(self, _candidate), fields(op = mutation.name()))]
    async fn apply(
        &self,
        mutation: &CartMutation,
        _candidate: &Cart,
    ) -> Result<Vec<LineItem>, PersistenceError> {
        let items = match mutation {
            CartMutation::Add {
                product_id,
                quantity,
                variant,
            } => {
                self.service
                    .add(product_id, *quantity, variant.as_ref())
                    .await?
            }
            CartMutation::SetQuantity {
                key,
                quantity,
                previous,
            } => self.replace_line(key, *quantity, *previous).await?,
            CartMutation::Remove { keys } => self.remove_lines(keys).await?,
            CartMutation::Clear => {
                let items = self.service.fetch().await?;
                if items.is_empty() {
                    return Ok(items);
                }
                let keys: Vec<_> = items.iter().map(LineItem::key).collect();
                debug!(lines = keys.len(), "clearing account cart");
                self.remove_lines(&keys).await?
            }
        };
        Ok(items)
    }
}
