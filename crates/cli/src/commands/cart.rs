//! Account cart inspection.
//!
//! # Usage
//!
//! ```bash
//! markethub-cli cart show --account acct-1
//! markethub-cli cart clear --account acct-1
//! ```

use std::fmt::Write as _;

use markethub_api::db::{CartRepository, PgCartRepository};
use markethub_core::{AccountId, LineItem, calculate_totals};

use super::{CliError, connect};

/// Print an account's cart with its totals.
pub async fn show(account: &str) -> Result<(), CliError> {
    let account = AccountId::new(account);
    let repository = PgCartRepository::new(connect().await?);
    let items = repository.load(&account).await?;

    #[allow(clippy::print_stdout)]
    {
        print!("{}", render(&account, &items));
    }
    Ok(())
}

/// Empty an account's cart.
pub async fn clear(account: &str) -> Result<(), CliError> {
    let account = AccountId::new(account);
    let repository = PgCartRepository::new(connect().await?);
    let removed = repository.load(&account).await?.len();
    repository.save(&account, &[]).await?;

    tracing::info!(account_id = %account, lines = removed, "Cart cleared");
    Ok(())
}

/// Plain-text rendering of a cart.
fn render(account: &AccountId, items: &[LineItem]) -> String {
    let mut out = format!("Cart for {account}\n");
    if items.is_empty() {
        out.push_str("  (empty)\n");
    }
    for item in items {
        let variant = item
            .variant
            .as_ref()
            .map(|v| format!(" [{v}]"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {} x {}{} @ {} = {}",
            item.quantity,
            item.product.name,
            variant,
            item.product.price,
            item.line_total().round_cents(),
        );
    }

    let totals = calculate_totals(items);
    let _ = writeln!(out, "Subtotal: {}", totals.subtotal);
    let _ = writeln!(out, "Tax:      {}", totals.tax);
    let _ = writeln!(out, "Shipping: {}", totals.shipping);
    let _ = writeln!(out, "Total:    {}", totals.total);
    out
}
