//! Profile repository for database operations.
//!
//! Profiles are written by a database trigger when the authentication
//! provider registers a user; the storefront only reads them.

use sqlx::PgPool;

use vitrine_core::ProfileId;

use super::RepositoryError;

/// Repository for profile lookups.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check whether the profile row for `id` exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: &ProfileId) -> Result<bool, RepositoryError> {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(
                SELECT 1 FROM storefront.profile
                WHERE id = $1
            )
            ",
        )
        .bind(id.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(row.0)
    }
}
