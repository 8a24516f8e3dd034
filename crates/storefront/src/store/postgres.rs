//! `PostgreSQL` adapter for the cart store.

use async_trait::async_trait;
use sqlx::PgPool;

use vitrine_core::{CartStatus, ProfileId};

use super::{CartStore, StoreError, UNIQUE_VIOLATION_CODE, is_conflict};
use crate::db::{CartRepository, ProfileRepository, RepositoryError};
use crate::models::Cart;

/// Cart store backed by the storefront database.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn profile_exists(&self, profile_id: &ProfileId) -> Result<bool, StoreError> {
        ProfileRepository::new(&self.pool)
            .exists(profile_id)
            .await
            .map_err(StoreError::from)
    }

    async fn active_carts(&self, profile_id: &ProfileId) -> Result<Vec<Cart>, StoreError> {
        CartRepository::new(&self.pool)
            .find_active(profile_id)
            .await
            .map_err(StoreError::from)
    }

    async fn insert_cart(
        &self,
        profile_id: &ProfileId,
        status: CartStatus,
    ) -> Result<Cart, StoreError> {
        CartRepository::new(&self.pool)
            .create(profile_id, status)
            .await
            .map_err(StoreError::from)
    }
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::Conflict {
                code: Some(UNIQUE_VIOLATION_CODE.to_owned()),
                status: None,
            },
            RepositoryError::Database(e) => Self::from(e),
            RepositoryError::DataCorruption(msg) => Self::Malformed(msg),
            RepositoryError::NotFound => Self::Rejected("not found".to_owned()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                if is_conflict(code.as_deref(), None) {
                    Self::Conflict { code, status: None }
                } else {
                    Self::Rejected(db_err.message().to_owned())
                }
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Unavailable(err.to_string()),
            sqlx::Error::RowNotFound
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => Self::Malformed(err.to_string()),
            _ => Self::Rejected(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_conflict_maps_to_store_conflict() {
        let err = StoreError::from(RepositoryError::Conflict("dup".to_owned()));
        assert_eq!(
            err,
            StoreError::Conflict {
                code: Some("23505".to_owned()),
                status: None,
            }
        );
    }

    #[test]
    fn test_pool_errors_are_transient() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_transient());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(StoreError::from(sqlx::Error::Io(io)).is_transient());
    }

    #[test]
    fn test_decode_failures_are_malformed() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Malformed(_)
        ));
        assert!(matches!(
            StoreError::from(RepositoryError::DataCorruption("bad id".to_owned())),
            StoreError::Malformed(_)
        ));
    }
}
