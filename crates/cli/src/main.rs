//! Vitrine CLI - Database migrations and cart management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! vitrine-cli migrate
//!
//! # Get or create a profile's active cart
//! vitrine-cli cart resolve --profile 6f1c0b7e-user
//!
//! # Close a cart
//! vitrine-cli cart set-status --cart 5b0c7d9e-3f1a-4c2b-9d8e-7a6b5c4d3e2f --status completed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use vitrine_core::{CartId, CartStatus, ProfileId};

mod commands;

#[derive(Parser)]
#[command(name = "vitrine-cli")]
#[command(author, version, about = "Vitrine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Get or create the active cart of a profile
    Resolve {
        /// Profile ID
        #[arg(short, long)]
        profile: ProfileId,
    },
    /// Set the status of a cart
    SetStatus {
        /// Cart ID
        #[arg(short, long)]
        cart: CartId,

        /// New status (`active`, `completed`, `abandoned`)
        #[arg(short, long)]
        status: CartStatus,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Cart { action } => match action {
            CartAction::Resolve { profile } => commands::cart::resolve(&profile).await?,
            CartAction::SetStatus { cart, status } => {
                commands::cart::set_status(cart, status).await?;
            }
        },
    }
    Ok(())
}
