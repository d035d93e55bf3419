//! Catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! markethub-cli products seed --file products.json
//! markethub-cli products seed --file products.json --dry-run
//! ```
//!
//! The file holds a JSON array of product snapshots:
//!
//! ```json
//! [
//!   {"id": "lamp", "name": "Desk Lamp", "price": "20.00",
//!    "inventory": {"tracking": "tracked", "available": 3}},
//!   {"id": "mug", "name": "Mug", "price": "8.50", "status": "draft"}
//! ]
//! ```

use std::collections::HashSet;
use std::path::Path;

use markethub_api::db::{PgProductRepository, ProductRepository};
use markethub_core::ProductSnapshot;

use super::{CliError, connect};

/// Seed products from a JSON file, replacing records with the same ID.
pub async fn seed(path: &Path, dry_run: bool) -> Result<(), CliError> {
    tracing::info!(path = %path.display(), "Loading products");
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_products(&content)?;
    tracing::info!(count = products.len(), "Validated products");

    if dry_run {
        tracing::info!("Dry run, nothing written");
        return Ok(());
    }

    let repository = PgProductRepository::new(connect().await?);
    for product in &products {
        repository.upsert(product).await?;
        tracing::debug!(product_id = %product.id, "Upserted product");
    }

    tracing::info!(count = products.len(), "Products seeded");
    Ok(())
}

/// Parse and validate a product seed file.
fn parse_products(content: &str) -> Result<Vec<ProductSnapshot>, CliError> {
    let products: Vec<ProductSnapshot> = serde_json::from_str(content)?;

    let mut seen = HashSet::new();
    for product in &products {
        if product.id.is_blank() {
            return Err(CliError::Invalid("product with blank id".to_string()));
        }
        if !seen.insert(product.id.as_str()) {
            return Err(CliError::Invalid(format!("duplicate product id {}", product.id)));
        }
        if product.price.is_negative() {
            return Err(CliError::Invalid(format!("negative price for {}", product.id)));
        }
        if product.name.trim().is_empty() {
            return Err(CliError::Invalid(format!("blank name for {}", product.id)));
        }
    }
    Ok(products)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use markethub_core::{Inventory, ProductStatus};

    use super::*;

    #[test]
    fn test_parse_products() {
        let products = parse_products(
            r#"[
                {"id": "lamp", "name": "Desk Lamp", "price": "20.00",
                 "inventory": {"tracking": "tracked", "available": 3}},
                {"id": "mug", "name": "Mug", "price": "8.50", "status": "draft"}
            ]"#,
        )
        .unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].inventory, Inventory::Tracked { available: 3 });
        assert_eq!(products[1].status, ProductStatus::Draft);
    }

    #[test]
    fn test_parse_products_rejects_bad_records() {
        for content in [
            r#"[{"id": " ", "name": "Lamp", "price": "1.00"}]"#,
            r#"[{"id": "a", "name": "A", "price": "1.00"}, {"id": "a", "name": "B", "price": "2.00"}]"#,
            r#"[{"id": "a", "name": "A", "price": "-1.00"}]"#,
            r#"[{"id": "a", "name": "", "price": "1.00"}]"#,
        ] {
            assert!(
                matches!(parse_products(content), Err(CliError::Invalid(_))),
                "{content}"
            );
        }
        assert!(matches!(parse_products("{}"), Err(CliError::Json(_))));
    }
}
