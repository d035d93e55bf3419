//! Account session issuing.
//!
//! # Usage
//!
//! ```bash
//! # Issue a token valid for 24 hours (creates the account if needed)
//! markethub-cli session create --account acct-1
//!
//! # Issue a token valid for a week
//! markethub-cli session create --account acct-1 --ttl-hours 168
//! ```

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{CliError, connect};

/// Issue a bearer token for `account` and print it.
pub async fn create(account: &str, ttl_hours: u32) -> Result<(), CliError> {
    if account.trim().is_empty() {
        return Err(CliError::Invalid("account id cannot be blank".to_string()));
    }
    let pool = connect().await?;

    sqlx::query("INSERT INTO accounts (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(account)
        .execute(&pool)
        .await?;

    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + Duration::hours(i64::from(ttl_hours));
    sqlx::query(
        "INSERT INTO account_sessions (token, account_id, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(&token)
    .bind(account)
    .bind(expires_at)
    .execute(&pool)
    .await?;

    tracing::info!(account_id = %account, %expires_at, "Session created");

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
