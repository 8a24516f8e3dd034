//! Process-local cart store.
//!
//! Behaves like the hosted store closely enough to exercise the resolver:
//! profiles can be provisioned late, inserts can be checked against a
//! one-active-cart-per-profile rule and a profile foreign key, and faults can be
//! queued for the next lookup or insert. Every operation yields to the runtime
//! once, so concurrent callers interleave the way they would across real
//! round trips.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use vitrine_core::{CartId, CartStatus, ProfileId};

use super::{CartStore, StoreError, UNIQUE_VIOLATION_CODE};
use crate::models::Cart;

/// In-memory [`CartStore`].
#[derive(Debug)]
pub struct InMemoryCartStore {
    state: Mutex<MemoryState>,
    enforce_unique_active: bool,
    profile_lookups: AtomicUsize,
    cart_lookups: AtomicUsize,
    insert_attempts: AtomicUsize,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Profile id -> number of lookups still to miss before it becomes visible.
    profiles: HashMap<ProfileId, u32>,
    /// Carts in insertion order.
    carts: Vec<Cart>,
    lookup_faults: VecDeque<StoreError>,
    insert_faults: VecDeque<StoreError>,
}

impl Default for InMemoryCartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCartStore {
    /// Create a store that rejects a second active cart for a profile.
    #[must_use]
    pub fn new() -> Self {
        Self::with_unique_active(true)
    }

    /// Create a store without the one-active-cart rule, like a schema that
    /// lacks the constraint.
    #[must_use]
    pub fn without_unique_constraint() -> Self {
        Self::with_unique_active(false)
    }

    fn with_unique_active(enforce_unique_active: bool) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            enforce_unique_active,
            profile_lookups: AtomicUsize::new(0),
            cart_lookups: AtomicUsize::new(0),
            insert_attempts: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Provision a profile that is visible immediately.
    pub fn add_profile(&self, profile_id: &ProfileId) {
        self.add_profile_after_lookups(profile_id, 0);
    }

    /// Provision a profile that stays invisible for the next `misses` lookups.
    pub fn add_profile_after_lookups(&self, profile_id: &ProfileId, misses: u32) {
        self.state().profiles.insert(profile_id.clone(), misses);
    }

    /// Insert a cart directly, bypassing the uniqueness rule.
    ///
    /// Used to seed data anomalies such as two active carts.
    pub fn seed_cart(&self, profile_id: &ProfileId, status: CartStatus) -> Cart {
        let mut state = self.state();
        push_cart(&mut state, profile_id, status)
    }

    /// Fail the next cart lookup with `err`.
    pub fn fail_next_lookup(&self, err: StoreError) {
        self.state().lookup_faults.push_back(err);
    }

    /// Fail the next insert with `err`.
    pub fn fail_next_insert(&self, err: StoreError) {
        self.state().insert_faults.push_back(err);
    }

    /// All carts of a profile, in insertion order.
    #[must_use]
    pub fn carts_for(&self, profile_id: &ProfileId) -> Vec<Cart> {
        self.state()
            .carts
            .iter()
            .filter(|c| &c.profile_id == profile_id)
            .cloned()
            .collect()
    }

    /// Number of profile lookups served so far.
    #[must_use]
    pub fn profile_lookups(&self) -> usize {
        self.profile_lookups.load(Ordering::SeqCst)
    }

    /// Number of active-cart lookups served so far.
    #[must_use]
    pub fn cart_lookups(&self) -> usize {
        self.cart_lookups.load(Ordering::SeqCst)
    }

    /// Number of insert attempts seen so far, including failed ones.
    #[must_use]
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }
}

fn push_cart(state: &mut MemoryState, profile_id: &ProfileId, status: CartStatus) -> Cart {
    let cart = Cart {
        id: CartId::generate(),
        profile_id: profile_id.clone(),
        status,
        created_at: Utc::now(),
    };
    state.carts.push(cart.clone());
    cart
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn profile_exists(&self, profile_id: &ProfileId) -> Result<bool, StoreError> {
        tokio::task::yield_now().await;
        self.profile_lookups.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state();
        match state.profiles.get_mut(profile_id) {
            Some(0) => Ok(true),
            Some(misses) => {
                *misses -= 1;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn active_carts(&self, profile_id: &ProfileId) -> Result<Vec<Cart>, StoreError> {
        tokio::task::yield_now().await;
        self.cart_lookups.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state();
        if let Some(err) = state.lookup_faults.pop_front() {
            return Err(err);
        }

        // Later insertions first, so equal timestamps keep newest-first order.
        let mut carts: Vec<Cart> = state
            .carts
            .iter()
            .rev()
            .filter(|c| &c.profile_id == profile_id && c.is_active())
            .cloned()
            .collect();
        carts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        carts.truncate(2);

        Ok(carts)
    }

    async fn insert_cart(
        &self,
        profile_id: &ProfileId,
        status: CartStatus,
    ) -> Result<Cart, StoreError> {
        tokio::task::yield_now().await;
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state();
        if let Some(err) = state.insert_faults.pop_front() {
            return Err(err);
        }

        if state.profiles.get(profile_id) != Some(&0) {
            return Err(StoreError::Rejected(format!(
                "insert or update on table \"cart\" violates foreign key constraint (profile {profile_id})"
            )));
        }

        if self.enforce_unique_active
            && status == CartStatus::Active
            && state
                .carts
                .iter()
                .any(|c| &c.profile_id == profile_id && c.is_active())
        {
            return Err(StoreError::Conflict {
                code: Some(UNIQUE_VIOLATION_CODE.to_owned()),
                status: None,
            });
        }

        Ok(push_cart(&mut state, profile_id, status))
    }
}
