//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! markethub-cli migrate
//! ```
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time. Applied migrations are tracked in `_sqlx_migrations`, so running the
//! command twice is a no-op.

use super::{CliError, connect};

/// Run API database migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
