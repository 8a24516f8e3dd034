//! Active cart acquisition against a migrated `PostgreSQL` database.
//!
//! These tests require `TEST_DATABASE_URL` pointing at a disposable database.
//!
//! Run with: `cargo test -p vitrine-integration-tests -- --include-ignored`

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use vitrine_core::CartStatus;
use vitrine_integration_tests::{insert_profile, migrated_pool, unique_profile_id};
use vitrine_storefront::db::{CartRepository, RepositoryError};
use vitrine_storefront::services::{CartResolution, CartResolver, ProfileWait};
use vitrine_storefront::store::PgCartStore;

fn resolver(pool: &sqlx::PgPool) -> CartResolver {
    let wait = ProfileWait {
        max_attempts: 2,
        interval: Duration::from_millis(10),
    };
    CartResolver::new(Arc::new(PgCartStore::new(pool.clone())), wait)
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_concurrent_resolves_create_one_active_cart() {
    let pool = migrated_pool().await;
    let profile_id = unique_profile_id("pg-burst");
    insert_profile(&pool, &profile_id).await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let resolver = resolver(&pool);
        let profile_id = profile_id.clone();
        tasks.spawn(async move { resolver.get_or_create_active_cart(&profile_id).await });
    }

    let mut cart_ids = Vec::new();
    while let Some(result) = tasks.join_next().await {
        cart_ids.push(result.unwrap().unwrap());
    }
    assert!(cart_ids.windows(2).all(|w| w[0] == w[1]));

    let active = CartRepository::new(&pool)
        .find_active(&profile_id)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, cart_ids[0]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_missing_profile_is_rejected_by_foreign_key() {
    let pool = migrated_pool().await;
    let profile_id = unique_profile_id("pg-ghost");

    let resolution = resolver(&pool).resolve(&profile_id).await;

    assert!(matches!(resolution, CartResolution::Failed(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_closing_cart_lets_next_resolve_create_another() {
    let pool = migrated_pool().await;
    let profile_id = unique_profile_id("pg-checkout");
    insert_profile(&pool, &profile_id).await;
    let resolver = resolver(&pool);
    let repo = CartRepository::new(&pool);

    let first = resolver.get_or_create_active_cart(&profile_id).await.unwrap();
    repo.set_status(first, CartStatus::Completed).await.unwrap();

    let second = resolver.get_or_create_active_cart(&profile_id).await.unwrap();
    assert_ne!(first, second);

    // Reopening the old cart would make two active carts.
    let err = repo.set_status(first, CartStatus::Active).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}
