//! Cart management commands.
//!
//! `resolve` runs the same acquisition as `POST /api/cart/active`, against the
//! store selected by `CART_STORE`; only the `postgres` store needs a database
//! connection. `set-status` closes or reopens a cart in the storefront
//! database.

use std::sync::Arc;

use vitrine_core::{CartId, CartStatus, ProfileId};
use vitrine_storefront::build_cart_resolver;
use vitrine_storefront::config::{CartConfig, CartStoreBackend};
use vitrine_storefront::db::CartRepository;
use vitrine_storefront::services::{CartResolution, CartResolver};
use vitrine_storefront::store::RestCartStore;

use super::{CommandError, connect};

/// Get or create the active cart of a profile and print its ID.
///
/// # Errors
///
/// Returns an error if configuration is invalid or no cart could be resolved.
pub async fn resolve(profile_id: &ProfileId) -> Result<(), CommandError> {
    let _ = dotenvy::dotenv();

    let config = CartConfig::from_env()?;
    let resolver = resolver_for(&config).await?;

    match resolver.resolve(profile_id).await {
        CartResolution::Resolved(cart_id) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{cart_id}");
            }
            Ok(())
        }
        CartResolution::RetryLater(err) => {
            tracing::warn!("Transient failure, the command can be retried");
            Err(err.into())
        }
        CartResolution::Failed(err) => Err(err.into()),
    }
}

/// Build a resolver for the configured store.
async fn resolver_for(config: &CartConfig) -> Result<CartResolver, CommandError> {
    match &config.backend {
        CartStoreBackend::Postgres => {
            let pool = connect().await?;
            Ok(build_cart_resolver(config, &pool)?)
        }
        CartStoreBackend::Rest(rest) => {
            tracing::info!(base_url = %rest.base_url, "Using hosted REST store");
            let store = RestCartStore::new(rest)?;
            Ok(CartResolver::new(Arc::new(store), config.profile_wait))
        }
    }
}

/// Set the status of a cart.
///
/// Reopening a cart fails with a conflict while the profile has another
/// active cart.
///
/// # Errors
///
/// Returns an error if the cart does not exist or the update conflicts.
pub async fn set_status(cart_id: CartId, status: CartStatus) -> Result<(), CommandError> {
    let pool = connect().await?;
    CartRepository::new(&pool)
        .set_status(cart_id, status)
        .await?;

    tracing::info!(cart_id = %cart_id, status = %status, "Cart status updated");
    Ok(())
}
