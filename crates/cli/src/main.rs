//! MarketHub CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run API database migrations
//! markethub-cli migrate
//!
//! # Load the catalog from a JSON file
//! markethub-cli products seed --file products.json
//!
//! # Issue a bearer token for an account
//! markethub-cli session create --account acct-1
//!
//! # Inspect or empty an account cart
//! markethub-cli cart show --account acct-1
//! markethub-cli cart clear --account acct-1
//! ```
//!
//! # Environment Variables
//!
//! - `MARKETHUB_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "markethub-cli")]
#[command(author, version, about = "MarketHub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage account sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Inspect account carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Insert or update products from a JSON file
    Seed {
        /// Path to a JSON array of products
        #[arg(short, long)]
        file: PathBuf,

        /// Validate the file without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Issue a bearer token for an account
    Create {
        /// Account ID
        #[arg(short, long)]
        account: String,

        /// Hours until the token expires
        #[arg(long, default_value_t = 24)]
        ttl_hours: u32,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print an account's cart and totals
    Show {
        /// Account ID
        #[arg(short, long)]
        account: String,
    },
    /// Remove every line from an account's cart
    Clear {
        /// Account ID
        #[arg(short, long)]
        account: String,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "markethub_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Products { action } => match action {
            ProductsAction::Seed { file, dry_run } => {
                commands::products::seed(&file, dry_run).await?;
            }
        },
        Commands::Session { action } => match action {
            SessionAction::Create { account, ttl_hours } => {
                commands::session::create(&account, ttl_hours).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show { account } => commands::cart::show(&account).await?,
            CartAction::Clear { account } => commands::cart::clear(&account).await?,
        },
    }
    Ok(())
}
