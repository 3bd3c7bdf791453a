//! Integration tests for Go Marketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Cart operations through provider handles
//! - `cart_persistence` - Restarts, file storage, and stored payload handling

use std::path::{Path, PathBuf};

use go_marketplace_cart::{CartConfig, CartProvider, FileStore};
use go_marketplace_core::NewCartItem;

/// Scratch data directory removed when dropped.
pub struct TempDataDir {
    path: PathBuf,
}

impl TempDataDir {
    /// Reserve a unique directory under the system temp dir.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("gm-it-{}", uuid::Uuid::new_v4())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default cart configuration pointing at this directory.
    #[must_use]
    pub fn config(&self) -> CartConfig {
        CartConfig {
            data_dir: self.path.clone(),
            ..CartConfig::default()
        }
    }

    /// Mount a file-backed cart in this directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory or stored cart cannot be opened.
    #[allow(clippy::expect_used)]
    pub async fn mount(&self, config: &CartConfig) -> CartProvider {
        let storage = FileStore::open(&self.path)
            .await
            .expect("open file store");
        CartProvider::mount(storage, config)
            .await
            .expect("mount cart")
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// The product used throughout the scenarios.
#[must_use]
pub fn shirt() -> NewCartItem {
    NewCartItem::new("p1", "Shirt", "u", 10)
}
