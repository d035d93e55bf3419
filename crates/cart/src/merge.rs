//! Folding a guest cart into an account cart at login.
//!
//! Each guest line is re-added to the account cart through the remote
//! service, in insertion order. The service's own increment-if-exists rule
//! sums lines that collide. A failed line is recorded and the remaining
//! lines are still submitted; lines that already succeeded are not rolled
//! back. The merge is best effort, not a transaction.

use markethub_core::{LineItem, LineKey, Quantity};
use tracing::{info, instrument, warn};

use crate::remote::{RemoteCartService, RemoteError};

/// A guest line the account cart did not accept.
#[derive(Debug)]
pub struct MergeFailure {
    /// The guest line.
    pub key: LineKey,
    /// Units that were not merged.
    pub quantity: Quantity,
    /// Why the service refused it.
    pub error: RemoteError,
}

/// Outcome of a merge.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Guest lines submitted.
    pub submitted: usize,
    /// Guest lines the account cart accepted.
    pub merged: usize,
    /// Guest lines the account cart refused.
    pub failures: Vec<MergeFailure>,
    /// The account cart as returned by the last successful submission.
    pub remote_items: Option<Vec<LineItem>>,
}

impl MergeReport {
    /// Whether every guest line was merged.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether some, but not all, guest lines were merged.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.merged > 0 && !self.failures.is_empty()
    }
}

/// Submit each guest line to the account cart.
///
/// Never fails as a whole; per-line failures are collected in the report.
#[instrument(skip_all, fields(lines = guest_items.len()))]
pub async fn merge_guest_cart(
    guest_items: &[LineItem],
    remote: &dyn RemoteCartService,
) -> MergeReport {
    let mut report = MergeReport::default();

    for item in guest_items {
        report.submitted += 1;
        let key = item.key();
        match remote
            .add(&item.product.id, item.quantity, item.variant.as_ref())
            .await
        {
            Ok(items) => {
                report.merged += 1;
                report.remote_items = Some(items);
            }
            Err(error) => {
                warn!(line = %key, error = %error, "guest line not merged");
                report.failures.push(MergeFailure {
                    key,
                    quantity: item.quantity,
                    error,
                });
            }
        }
    }

    info!(
        merged = report.merged,
        failed = report.failures.len(),
        "guest cart merged"
    );
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use markethub_core::{Cart, ProductId};

    use super::*;
    use crate::test_support::{FakeRemote, product, tracked};

    fn guest(lines: &[(&str, u32)]) -> Vec<LineItem> {
        let mut cart = Cart::new();
        for (id, quantity) in lines {
            cart.add(
                product(id, 1000),
                Quantity::new(*quantity).unwrap(),
                None,
                Utc::now(),
            )
            .unwrap();
        }
        cart.into_items()
    }

    #[tokio::test]
    async fn test_merge_sums_colliding_lines() {
        let remote = FakeRemote::new([product("a", 1000), product("b", 1000)]).with_line("a", 3);

        let report = merge_guest_cart(&guest(&[("a", 1), ("b", 2)]), &remote).await;

        assert!(report.is_complete());
        assert_eq!(report.merged, 2);
        assert_eq!(remote.quantity_of("a"), 4);
        assert_eq!(remote.quantity_of("b"), 2);
        assert_eq!(report.remote_items.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_lines() {
        let remote = FakeRemote::new([product("a", 1000), product("b", 1000), product("c", 1000)]);
        remote.fail_on("b");

        let report = merge_guest_cart(&guest(&[("a", 1), ("b", 1), ("c", 1)]), &remote).await;

        assert!(report.is_partial());
        assert_eq!(report.submitted, 3);
        assert_eq!(report.merged, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures.first().unwrap().key.product_id,
            ProductId::new("b")
        );
        assert_eq!(remote.quantity_of("c"), 1);
    }

    #[tokio::test]
    async fn test_stock_rejection_is_recorded() {
        let remote = FakeRemote::new([tracked("a", 1000, 2)]).with_line("a", 2);

        let report = merge_guest_cart(&guest(&[("a", 1)]), &remote).await;

        assert!(!report.is_complete());
        assert!(!report.is_partial());
        assert!(report.remote_items.is_none());
        assert!(matches!(
            &report.failures.first().unwrap().error,
            RemoteError::Rejected { reason: Some(r), .. } if r == "insufficient_stock"
        ));
        assert_eq!(remote.quantity_of("a"), 2);
    }

    #[tokio::test]
    async fn test_empty_guest_cart() {
        let remote = FakeRemote::new([product("a", 1000)]);
        let report = merge_guest_cart(&[], &remote).await;
        assert!(report.is_complete());
        assert_eq!(report.submitted, 0);
        assert!(remote.calls().is_empty());
    }
}
