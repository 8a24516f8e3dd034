//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{AccessTokenVerifier, CartResolver};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    carts: CartResolver,
    tokens: AccessTokenVerifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `carts` - Resolver over the configured cart store
    /// * `tokens` - Verifier for bearer access tokens
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        carts: CartResolver,
        tokens: AccessTokenVerifier,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
                tokens,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the active cart resolver.
    #[must_use]
    pub fn carts(&self) -> &CartResolver {
        &self.inner.carts
    }

    /// Get a reference to the access token verifier.
    #[must_use]
    pub fn tokens(&self) -> &AccessTokenVerifier {
        &self.inner.tokens
    }
}
