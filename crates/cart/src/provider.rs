//! Provider scope and consumer handles.
//!
//! The application mounts one [`CartProvider`] at startup and passes
//! [`CartHandle`]s to whatever needs the cart. Handles do not keep the cart
//! alive: once the provider is unmounted (or if a handle was never attached
//! to one), every handle operation fails with [`CartError::OutOfScope`].

use std::sync::{Arc, Weak};

use go_marketplace_core::NewCartItem;
use tracing::{info, instrument};

use crate::config::CartConfig;
use crate::error::CartError;
use crate::state::CartState;
use crate::storage::KeyValueStore;
use crate::store::CartStore;

/// Owner of the mounted cart.
#[derive(Debug)]
pub struct CartProvider {
    store: Arc<CartStore>,
}

impl CartProvider {
    /// Load the cart from `storage` and start its writer.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the stored cart cannot be read.
    pub async fn mount<S: KeyValueStore>(storage: S, config: &CartConfig) -> Result<Self, CartError> {
        let store = CartStore::load(storage, config).await?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// A handle bound to this provider.
    #[must_use]
    pub fn handle(&self) -> CartHandle {
        CartHandle {
            store: Arc::downgrade(&self.store),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &CartStore {
        &self.store
    }

    /// Flush pending writes and end the scope.
    ///
    /// Handles obtained from this provider stop working afterwards.
    ///
    /// # Errors
    ///
    /// Returns the flush error, if any. The scope ends either way.
    #[instrument(skip_all)]
    pub async fn unmount(self) -> Result<(), CartError> {
        let result = self.store.flush().await;
        info!(ok = result.is_ok(), "Cart provider unmounted");
        result
    }
}

/// Consumer access to the cart.
///
/// Cheap to clone. A default handle is not attached to any provider.
#[derive(Debug, Clone, Default)]
pub struct CartHandle {
    store: Weak<CartStore>,
}

impl CartHandle {
    /// A handle with no provider behind it.
    #[must_use]
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Whether the provider is still mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.store.strong_count() > 0
    }

    /// Current cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfScope` if no provider is mounted.
    pub fn products(&self) -> Result<CartState, CartError> {
        Ok(self.store()?.products())
    }

    /// Add a product with quantity one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfScope` if no provider is mounted.
    pub fn add_to_cart(&self, item: NewCartItem) -> Result<CartState, CartError> {
        Ok(self.store()?.add_to_cart(item))
    }

    /// Increment the quantity of `id`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfScope` if no provider is mounted.
    pub fn increment(&self, id: &str) -> Result<CartState, CartError> {
        Ok(self.store()?.increment(id))
    }

    /// Decrement the quantity of `id`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfScope` if no provider is mounted.
    pub fn decrement(&self, id: &str) -> Result<CartState, CartError> {
        Ok(self.store()?.decrement(id))
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfScope` if no provider is mounted.
    pub fn clear(&self) -> Result<CartState, CartError> {
        Ok(self.store()?.clear())
    }

    /// Wait for the current state to be written.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfScope` if no provider is mounted, or the
    /// writer's error if persisting failed.
    pub async fn flush(&self) -> Result<(), CartError> {
        self.store()?.flush().await
    }

    fn store(&self) -> Result<Arc<CartStore>, CartError> {
        self.store.upgrade().ok_or(CartError::OutOfScope)
    }
}
