//! Go Marketplace Cart - Persisted shopping cart state container.
//!
//! Holds the cart lines in memory, mirrors the whole cart into a key-value
//! string store after every change, and hands out handles for reading and
//! mutating it.
//!
//! # Architecture
//!
//! - [`CartProvider`] is mounted once at startup: it loads the stored cart
//!   and starts a single background writer
//! - [`CartHandle`]s are passed to consumers; they fail with
//!   [`CartError::OutOfScope`] once the provider is gone
//! - [`CartState`] snapshots are immutable; mutations build a new state
//! - Writes are serialized through one task and superseded by newer states,
//!   so storage converges to the latest cart
//!
//! # Example
//!
//! ```rust,no_run
//! use go_marketplace_cart::{CartConfig, CartProvider, FileStore};
//! use go_marketplace_core::NewCartItem;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CartConfig::from_env()?;
//! let storage = FileStore::open(&config.data_dir).await?;
//! let provider = CartProvider::mount(storage, &config).await?;
//!
//! let cart = provider.handle();
//! cart.add_to_cart(NewCartItem::new("p1", "Shirt", "https://img/p1.png", 10))?;
//! cart.increment("p1")?;
//!
//! provider.unmount().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod config;
pub mod error;
pub mod policy;
pub mod provider;
pub mod state;
pub mod storage;
pub mod store;
pub mod writer;

pub use config::{CartConfig, ConfigError};
pub use error::CartError;
pub use policy::{CartPolicy, DecrementPolicy, DuplicatePolicy};
pub use provider::{CartHandle, CartProvider};
pub use state::CartState;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::CartStore;
pub use writer::{PersistStatus, RetryPolicy};
