//! Integration tests for Vitrine.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios (no external services)
//! cargo test -p vitrine-integration-tests
//!
//! # Including PostgreSQL scenarios
//! TEST_DATABASE_URL=postgres://localhost/vitrine_test \
//!     cargo test -p vitrine-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_resolver` - Active cart acquisition against the in-memory store
//! - `postgres_cart_store` - The same acquisition against a migrated database

use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use vitrine_core::ProfileId;
use vitrine_storefront::db;

/// A profile ID that no other test uses.
///
/// # Panics
///
/// Never in practice: a prefixed UUID is always a valid profile ID.
#[must_use]
#[allow(clippy::expect_used)]
pub fn unique_profile_id(prefix: &str) -> ProfileId {
    ProfileId::parse(&format!("{prefix}-{}", Uuid::new_v4())).expect("valid profile id")
}

/// Connect to `TEST_DATABASE_URL` and apply the storefront migrations.
///
/// # Panics
///
/// Panics if the variable is unset, the database is unreachable, or a
/// migration fails.
#[allow(clippy::expect_used)]
pub async fn migrated_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Provision a profile row, as the sign-up trigger would.
///
/// # Panics
///
/// Panics if the insert fails.
#[allow(clippy::expect_used)]
pub async fn insert_profile(pool: &PgPool, profile_id: &ProfileId) {
    sqlx::query("INSERT INTO storefront.profile (id) VALUES ($1)")
        .bind(profile_id.as_str())
        .execute(pool)
        .await
        .expect("Failed to insert profile");
}
