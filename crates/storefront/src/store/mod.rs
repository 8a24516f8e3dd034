//! Cart store port and its adapters.
//!
//! The cart resolver talks to the backing store only through [`CartStore`].
//! Three adapters exist:
//!
//! - [`PgCartStore`] - direct `PostgreSQL` access through the repositories in [`crate::db`]
//! - [`RestCartStore`] - the hosted platform's REST interface
//! - [`InMemoryCartStore`] - process-local store for tests and local runs
//!
//! # Conflicts
//!
//! A write that loses a race for the single active cart is reported as
//! [`StoreError::Conflict`]. Adapters recognise it through [`is_conflict`],
//! which accepts either the duplicate-key SQLSTATE or an HTTP 409. An adapter
//! that sees both lets a reported SQLSTATE decide, since a 409 also carries
//! foreign-key violations.

pub mod memory;
pub mod postgres;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use vitrine_core::{CartStatus, ProfileId};

use crate::models::Cart;

pub use memory::InMemoryCartStore;
pub use postgres::PgCartStore;
pub use rest::RestCartStore;

/// SQLSTATE reported for a unique-constraint violation.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// HTTP status reported by the hosted REST interface for a conflicting write.
pub const HTTP_CONFLICT_STATUS: u16 = 409;

/// Errors reported by a [`CartStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The write would violate a uniqueness rule.
    #[error("uniqueness conflict (code: {code:?}, status: {status:?})")]
    Conflict {
        /// Store-specific error code, if one was reported.
        code: Option<String>,
        /// Transport status, if the store is reached over HTTP.
        status: Option<u16>,
    },

    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request (constraint, permission, bad input).
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The store answered with data that could not be understood.
    #[error("malformed store response: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Whether this error signals a lost race on a uniqueness rule.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether repeating the same request later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Decide whether a store failure is a uniqueness conflict.
///
/// Both signals are checked: the duplicate-key error code and the HTTP
/// conflict status on the write response.
#[must_use]
pub fn is_conflict(code: Option<&str>, status: Option<u16>) -> bool {
    code == Some(UNIQUE_VIOLATION_CODE) || status == Some(HTTP_CONFLICT_STATUS)
}

/// Backing store for profiles and carts.
///
/// Implementations perform one remote round trip per call and hold no
/// client-side locks; concurrent inserts are serialised by the store itself.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Check whether the profile row for `profile_id` exists.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the lookup itself fails.
    async fn profile_exists(&self, profile_id: &ProfileId) -> Result<bool, StoreError>;

    /// Get the active carts of a profile, newest first.
    ///
    /// At most two carts are returned; more than one means the
    /// single-active-cart invariant was broken.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the lookup fails.
    async fn active_carts(&self, profile_id: &ProfileId) -> Result<Vec<Cart>, StoreError>;

    /// Insert a new cart for a profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if another active cart won the race,
    /// or another `StoreError` for any other failure.
    async fn insert_cart(
        &self,
        profile_id: &ProfileId,
        status: CartStatus,
    ) -> Result<Cart, StoreError>;
}

#[async_trait]
impl<S> CartStore for Arc<S>
where
    S: CartStore + ?Sized,
{
    async fn profile_exists(&self, profile_id: &ProfileId) -> Result<bool, StoreError> {
        (**self).profile_exists(profile_id).await
    }

    async fn active_carts(&self, profile_id: &ProfileId) -> Result<Vec<Cart>, StoreError> {
        (**self).active_carts(profile_id).await
    }

    async fn insert_cart(
        &self,
        profile_id: &ProfileId,
        status: CartStatus,
    ) -> Result<Cart, StoreError> {
        (**self).insert_cart(profile_id, status).await
    }
}
