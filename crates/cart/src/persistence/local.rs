//! Device-local cart storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use markethub_core::{Cart, LineItem};
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::{AdapterKind, CartMutation, CartPersistence};
use crate::error::PersistenceError;

/// Fixed storage key for the guest cart.
pub const STORAGE_KEY: &str = "markethub_cart";

/// Stores the guest cart as JSON in `<dir>/markethub_cart.json`.
///
/// The file is read once when the store starts and rewritten in full after
/// every mutation. It is tied to this device and never shared.
#[derive(Debug, Clone)]
pub struct LocalCartAdapter {
    path: PathBuf,
}

impl LocalCartAdapter {
    /// Create an adapter storing the cart under `dir`.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Location of the cart file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the stored cart. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn clear_storage(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("cleared local cart");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `items`, replacing the stored cart.
    ///
    /// Writes to a temp file and renames it so a crash never leaves a
    /// half-written cart behind.
    async fn write(&self, items: &[LineItem]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");

        if let Err(e) = fs::write(&tmp, &json).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CartPersistence for LocalCartAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Local
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<LineItem>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Vec<LineItem>>(&contents) {
            // Duplicate keys written by an older client are folded together
            Ok(items) => Ok(Cart::from_items(items).into_items()),
            Err(e) => {
                warn!(error = %e, "stored cart is malformed, starting empty");
                Ok(Vec::new())
            }
        }
    }

    #[instrument(skip(self, candidate), fields(op = mutation.name()))]
    async fn apply(
        &self,
        mutation: &CartMutation,
        candidate: &Cart,
    ) -> Result<Vec<LineItem>, PersistenceError> {
        self.write(candidate.items()).await?;
        Ok(candidate.items().to_vec())
    }
}
