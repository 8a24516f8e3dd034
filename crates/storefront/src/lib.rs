//! Vitrine storefront library.
//!
//! Resolves the single active cart of a signed-in profile against a
//! `PostgreSQL` or hosted REST store, and serves it over HTTP. The binary in
//! `main.rs` and the CLI both build on this library.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use config::{CartConfig, CartStoreBackend};
use services::CartResolver;
use sqlx::PgPool;
use store::{CartStore, PgCartStore, RestCartStore, StoreError};

/// Build the cart resolver for the configured store backend.
///
/// # Errors
///
/// Returns `StoreError` if the REST client cannot be constructed.
pub fn build_cart_resolver(config: &CartConfig, pool: &PgPool) -> Result<CartResolver, StoreError> {
    let store: Arc<dyn CartStore> = match &config.backend {
        CartStoreBackend::Postgres => Arc::new(PgCartStore::new(pool.clone())),
        CartStoreBackend::Rest(rest) => Arc::new(RestCartStore::new(rest)?),
    };
    Ok(CartResolver::new(store, config.profile_wait))
}
