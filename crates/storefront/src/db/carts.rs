//! Cart repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{CartId, CartStatus, ProfileId};

use super::RepositoryError;
use crate::models::Cart;

/// Maximum number of active carts fetched per lookup.
///
/// One is the expected case; a second row means the single-active-cart
/// invariant was broken and is reported by the caller.
const ACTIVE_CART_LOOKUP_LIMIT: i64 = 2;

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the active carts of a profile, newest first.
    ///
    /// At most two rows are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored profile id is invalid.
    pub async fn find_active(&self, profile_id: &ProfileId) -> Result<Vec<Cart>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, profile_id, status, created_at
            FROM storefront.cart
            WHERE profile_id = $1 AND status = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            ",
        )
        .bind(profile_id.as_str())
        .bind(CartStatus::Active)
        .bind(ACTIVE_CART_LOOKUP_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Cart::try_from).collect()
    }

    /// Insert a new cart for a profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the insert violates a uniqueness
    /// constraint (another active cart already exists).
    /// Returns `RepositoryError::Database` for other database errors, including
    /// a foreign-key violation when the profile does not exist.
    pub async fn create(
        &self,
        profile_id: &ProfileId,
        status: CartStatus,
    ) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO storefront.cart (profile_id, status)
            VALUES ($1, $2)
            RETURNING id, profile_id, status, created_at
            ",
        )
        .bind(profile_id.as_str())
        .bind(status)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("active cart already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Cart::try_from(row)
    }

    /// Change the status of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    /// Returns `RepositoryError::Conflict` if reactivating the cart would give
    /// its profile a second active cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_status(&self, id: CartId, status: CartStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.cart
            SET status = $1
            WHERE id = $2
            ",
        )
        .bind(status)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("active cart already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Internal row type for cart queries.
#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    profile_id: String,
    status: CartStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let profile_id = ProfileId::parse(&row.profile_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid profile id in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            profile_id,
            status: row.status,
            created_at: row.created_at,
        })
    }
}
