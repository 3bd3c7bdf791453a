//! The authoritative cart.
//!
//! [`CartStore`] owns the current [`CartState`] and mirrors it into a
//! [`KeyValueStore`] under a single fixed key. Mutations swap in a new state
//! synchronously, so callers observe each change immediately and in call
//! order; the full new state is then handed to the background writer.

use std::sync::{Arc, PoisonError, RwLock};

use go_marketplace_core::NewCartItem;
use tracing::{debug, info, instrument};

use crate::codec;
use crate::config::CartConfig;
use crate::error::CartError;
use crate::policy::CartPolicy;
use crate::state::CartState;
use crate::storage::KeyValueStore;
use crate::writer::{PersistStatus, PersistWriter};

#[derive(Debug)]
struct Current {
    state: CartState,
    generation: u64,
}

/// In-memory cart mirrored to persistent storage.
#[derive(Debug)]
pub struct CartStore {
    current: RwLock<Current>,
    policy: CartPolicy,
    writer: PersistWriter,
}

impl CartStore {
    /// Load the cart stored under the configured key.
    ///
    /// A missing, blank or unreadable payload yields an empty cart. Must be
    /// called from within a Tokio runtime (the writer task is spawned here).
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the backend cannot be read at all.
    #[instrument(skip_all, fields(key = %config.storage_key))]
    pub async fn load<S: KeyValueStore>(storage: S, config: &CartConfig) -> Result<Self, CartError> {
        let storage = Arc::new(storage);
        let payload = storage.get(&config.storage_key).await?;
        let state = CartState::from(codec::decode_or_empty(payload.as_deref()));

        info!(lines = state.len(), units = state.item_count(), "Cart loaded");

        let writer = PersistWriter::spawn(
            storage,
            config.storage_key.clone(),
            config.persist,
            state.clone(),
        );

        Ok(Self {
            current: RwLock::new(Current {
                state,
                generation: 0,
            }),
            policy: config.policy,
            writer,
        })
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn products(&self) -> CartState {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
            .clone()
    }

    /// Append `item` with quantity one (or merge, per policy).
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub fn add_to_cart(&self, item: NewCartItem) -> CartState {
        let duplicate = self.policy.duplicate;
        self.apply(|state| state.with_added(item, duplicate))
    }

    /// Increase the quantity of every line for `id` by one.
    #[instrument(skip(self))]
    pub fn increment(&self, id: &str) -> CartState {
        self.apply(|state| state.with_incremented(id))
    }

    /// Decrease the quantity of every line for `id` by one, per policy.
    #[instrument(skip(self))]
    pub fn decrement(&self, id: &str) -> CartState {
        let decrement = self.policy.decrement;
        self.apply(|state| state.with_decremented(id, decrement))
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear(&self) -> CartState {
        self.apply(|_| CartState::empty())
    }

    /// Wait until the state as of this call has been written.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persist` if the write failed after retries.
    pub async fn flush(&self) -> Result<(), CartError> {
        let generation = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation;
        self.writer.flush(generation).await
    }

    /// Writer progress.
    #[must_use]
    pub fn persist_status(&self) -> PersistStatus {
        self.writer.status()
    }

    fn apply(&self, transition: impl FnOnce(&CartState) -> CartState) -> CartState {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let next = transition(&current.state);
        current.generation += 1;
        current.state = next.clone();
        // Submitted under the lock so generations reach the writer in order
        self.writer.submit(current.generation, next.clone());

        debug!(
            generation = current.generation,
            lines = next.len(),
            "Cart updated"
        );
        next
    }
}
