//! Active-cart acquisition.
//!
//! Every signed-in profile has at most one `active` cart. [`CartResolver`]
//! returns that cart, creating it on first use:
//!
//! 1. Wait (bounded) for the profile row that the cart's foreign key needs.
//! 2. Look up an existing active cart.
//! 3. Otherwise insert one. If the insert loses a race to a concurrent caller,
//!    look up once more and return the winner's cart.
//!
//! No client-side lock is taken. The store's uniqueness signal is the only
//! serialisation point between concurrent callers.

mod error;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use vitrine_core::{CartId, CartStatus, ProfileId};

pub use error::CartError;

use crate::store::CartStore;

/// Default number of profile lookups before giving up on the wait.
pub const DEFAULT_PROFILE_WAIT_ATTEMPTS: u32 = 5;

/// Default pause after each profile lookup miss.
pub const DEFAULT_PROFILE_WAIT_INTERVAL: Duration = Duration::from_millis(500);

/// Bounds of the profile availability wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileWait {
    /// Maximum number of profile lookups.
    pub max_attempts: u32,
    /// Fixed pause after each miss.
    pub interval: Duration,
}

impl Default for ProfileWait {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_PROFILE_WAIT_ATTEMPTS,
            interval: DEFAULT_PROFILE_WAIT_INTERVAL,
        }
    }
}

/// Outcome of an active-cart acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartResolution {
    /// The profile's active cart.
    Resolved(CartId),
    /// Acquisition failed for a reason that may clear on its own; the user
    /// action can be retried now.
    RetryLater(CartError),
    /// Acquisition failed and retrying the same request will not help.
    Failed(CartError),
}

impl CartResolution {
    fn from_error(err: CartError) -> Self {
        if err.is_transient() {
            Self::RetryLater(err)
        } else {
            Self::Failed(err)
        }
    }

    /// The resolved cart ID, if any.
    #[must_use]
    pub const fn cart_id(&self) -> Option<CartId> {
        match self {
            Self::Resolved(id) => Some(*id),
            Self::RetryLater(_) | Self::Failed(_) => None,
        }
    }
}

/// Finds or creates the single active cart of a profile.
///
/// Cheap to clone; holds no per-call state.
#[derive(Clone)]
pub struct CartResolver {
    store: Arc<dyn CartStore>,
    wait: ProfileWait,
}

impl CartResolver {
    /// Create a resolver over a cart store.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, wait: ProfileWait) -> Self {
        Self { store, wait }
    }

    /// Get the profile's active cart, creating it if absent.
    ///
    /// Never fails: any error is logged and reported as `None`. Use
    /// [`resolve`](Self::resolve) to tell transient failures from permanent ones.
    pub async fn get_or_create_active_cart(&self, profile_id: &ProfileId) -> Option<CartId> {
        self.resolve(profile_id).await.cart_id()
    }

    /// Get the profile's active cart, creating it if absent.
    #[instrument(skip(self), fields(profile_id = %profile_id))]
    pub async fn resolve(&self, profile_id: &ProfileId) -> CartResolution {
        match self.acquire(profile_id).await {
            Ok(cart_id) => CartResolution::Resolved(cart_id),
            Err(err) => {
                error!(
                    error = %err,
                    transient = err.is_transient(),
                    "Active cart acquisition failed"
                );
                CartResolution::from_error(err)
            }
        }
    }

    async fn acquire(&self, profile_id: &ProfileId) -> Result<CartId, CartError> {
        // A timed-out wait is not fatal: the store's foreign key decides.
        self.await_profile(profile_id).await;

        if let Some(cart_id) = self.find_active_cart(profile_id).await? {
            debug!(cart_id = %cart_id, "Found existing active cart");
            return Ok(cart_id);
        }

        self.create_active_cart(profile_id).await
    }

    /// Wait until the profile row exists.
    ///
    /// Performs at most `max_attempts` lookups and sleeps `interval` after each
    /// miss. A failed lookup counts as a miss. Returns `false` once the bound is
    /// exhausted.
    pub async fn await_profile(&self, profile_id: &ProfileId) -> bool {
        for attempt in 1..=self.wait.max_attempts {
            match self.store.profile_exists(profile_id).await {
                Ok(true) => {
                    debug!(attempt, "Profile available");
                    return true;
                }
                Ok(false) => debug!(attempt, "Profile not provisioned yet"),
                Err(err) => debug!(attempt, error = %err, "Profile lookup failed"),
            }

            tokio::time::sleep(self.wait.interval).await;
        }

        let err = CartError::ProfileNotReady {
            profile_id: profile_id.clone(),
            attempts: self.wait.max_attempts,
        };
        warn!(error = %err, "Profile check timed out, attempting cart creation anyway");
        false
    }

    /// Look up the profile's active cart.
    ///
    /// If the store holds more than one active cart for the profile, the
    /// most recently created one is returned and the anomaly is logged.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the lookup fails.
    pub async fn find_active_cart(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<CartId>, CartError> {
        let carts = self.store.active_carts(profile_id).await?;

        if carts.len() > 1 {
            warn!(
                cart_ids = ?carts.iter().map(|c| c.id).collect::<Vec<_>>(),
                "Profile has more than one active cart, using the newest"
            );
        }

        Ok(carts.first().map(|c| c.id))
    }

    /// Insert a new active cart, recovering from a lost race.
    ///
    /// A uniqueness conflict means a concurrent caller created the cart first;
    /// the lookup is re-run once and the winner's cart returned.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ConflictUnresolved` if the insert conflicted but the
    /// re-lookup found nothing.
    /// Returns `CartError::Store` for any other store failure.
    pub async fn create_active_cart(&self, profile_id: &ProfileId) -> Result<CartId, CartError> {
        match self.store.insert_cart(profile_id, CartStatus::Active).await {
            Ok(cart) => {
                info!(cart_id = %cart.id, "Created active cart");
                Ok(cart.id)
            }
            Err(err) if err.is_conflict() => {
                info!(error = %err, "Cart insert conflicted, fetching concurrent winner");
                self.find_active_cart(profile_id)
                    .await?
                    .ok_or(CartError::ConflictUnresolved)
            }
            Err(err) => Err(err.into()),
        }
    }
}
