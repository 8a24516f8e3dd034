//! CLI subcommand implementations.

pub mod cart;
pub mod migrate;

use sqlx::PgPool;
use vitrine_storefront::config::{ConfigError, get_database_url};
use vitrine_storefront::db;

/// Connect to the storefront database named by `STOREFRONT_DATABASE_URL`
/// (or `DATABASE_URL`).
async fn connect() -> Result<PgPool, CommandError> {
    let _ = dotenvy::dotenv();

    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Errors shared by all commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] vitrine_storefront::db::RepositoryError),

    #[error("Cart store error: {0}")]
    Store(#[from] vitrine_storefront::store::StoreError),

    #[error("Cart error: {0}")]
    Cart(#[from] vitrine_storefront::services::CartError),
}
