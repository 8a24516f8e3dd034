//! Cart service error types.

use thiserror::Error;

use vitrine_core::ProfileId;

use crate::store::StoreError;

/// Errors that can occur while acquiring an active cart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    /// The profile row did not appear within the polling bound.
    ///
    /// Only logged; cart creation is attempted anyway.
    #[error("profile {profile_id} not provisioned after {attempts} lookups")]
    ProfileNotReady {
        /// Profile that was waited for.
        profile_id: ProfileId,
        /// Number of lookups performed.
        attempts: u32,
    },

    /// The insert lost a race but the winning cart could not be found.
    #[error("insert conflicted but no active cart was found on re-lookup")]
    ConflictUnresolved,

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    /// Whether retrying the user action right away may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::ProfileNotReady { .. } | Self::ConflictUnresolved => true,
            Self::Store(err) => err.is_transient(),
        }
    }
}
