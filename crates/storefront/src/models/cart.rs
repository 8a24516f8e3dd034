//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{CartId, CartStatus, ProfileId};

/// A shopping cart owned by a profile (domain type).
///
/// Line items live with the commerce backend; the storefront only tracks
/// which cart is the profile's current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Store-assigned cart ID.
    pub id: CartId,
    /// Profile that owns this cart.
    pub profile_id: ProfileId,
    /// Lifecycle status.
    pub status: CartStatus,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Whether this is the profile's current, not-yet-checked-out cart.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == CartStatus::Active
    }
}
