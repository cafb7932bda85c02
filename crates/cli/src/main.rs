//! Knotwork CLI - back-office tasks from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Import products from a spreadsheet
//! kw-cli products import catalog.xlsx
//!
//! # List pending orders
//! kw-cli orders list --status pending
//!
//! # Check the backend is reachable
//! kw-cli health
//! ```
//!
//! # Authentication
//!
//! Commands that touch the backend need a staff token: either
//! `ADMIN_API_TOKEN`, or `--email` with `ADMIN_PASSWORD` to sign in first.
//! `BACKEND_API_URL` (or `--backend-url`) points at the REST backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use knotwork_core::types::OrderStatus;

mod commands;

use commands::{CliError, Credentials};

#[derive(Parser)]
#[command(name = "kw-cli")]
#[command(author, version, about = "Knotwork back-office tools")]
struct Cli {
    /// REST backend base URL
    #[arg(long, env = "BACKEND_API_URL", global = true)]
    backend_url: Option<String>,

    /// Staff bearer token
    #[arg(long, env = "ADMIN_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Staff email, used with `ADMIN_PASSWORD` when no token is given
    #[arg(long, global = true)]
    email: Option<String>,

    /// Staff password
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Check the backend is reachable
    Health,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create or update products from an `.xlsx` spreadsheet
    Import {
        /// Path to the workbook
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders, newest first
    List {
        /// Only orders in this status (pending, processing, shipped, delivered, cancelled)
        #[arg(short, long)]
        status: Option<OrderStatus>,

        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kw_cli=info,knotwork_admin=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = commands::connect(cli.backend_url.as_deref())?;
    let credentials = Credentials::new(cli.token, cli.email, cli.password);

    match cli.command {
        Commands::Health => commands::health::check(&client).await,
        Commands::Products { action } => match action {
            ProductAction::Import { file } => {
                let token = credentials.bearer_token(&client).await?;
                commands::products::import(&client, &token, &file).await
            }
        },
        Commands::Orders { action } => match action {
            OrderAction::List { status, page } => {
                let token = credentials.bearer_token(&client).await?;
                commands::orders::list(&client, &token, status, page).await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_order_filters() {
        let cli = Cli::try_parse_from([
            "kw-cli", "orders", "list", "--status", "shipped", "--page", "2",
        ]);
        let Ok(Cli {
            command: Commands::Orders {
                action: OrderAction::List { status, page },
            },
            ..
        }) = cli
        else {
            panic!("expected orders list");
        };
        assert_eq!(status, Some(OrderStatus::Shipped));
        assert_eq!(page, 2);
    }

    #[test]
    fn test_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["kw-cli", "orders", "list", "--status", "lost"]).is_err());
    }
}
