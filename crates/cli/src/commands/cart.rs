//! Cart commands.
//!
//! Each command mounts the cart from the file store, applies at most one
//! mutation, and unmounts, which waits for the write to land.
//!
//! # Usage
//!
//! ```bash
//! gm-cart add --id p1 --title Shirt --image-url https://img/p1.png --price 10
//! gm-cart increment p1
//! gm-cart show --json
//! ```
//!
//! # Environment Variables
//!
//! See `go_marketplace_cart::config` for the `CART_*` variables.

use go_marketplace_cart::{
    CartConfig, CartError, CartProvider, CartState, ConfigError, FileStore, StorageError,
};
use go_marketplace_core::NewCartItem;
use thiserror::Error;
use tracing::{info, instrument};

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The data directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Output could not be rendered.
    #[error("Render error: {0}")]
    Render(#[from] serde_json::Error),
}

/// A single cart operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    Show,
    Add(NewCartItem),
    Increment(String),
    Decrement(String),
    Clear,
}

/// Run `command` against the cart in `config.data_dir`.
///
/// # Returns
///
/// The cart state after the command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the write fails.
#[instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub async fn execute(command: CartCommand, config: &CartConfig) -> Result<CartState, CommandError> {
    let storage = FileStore::open(&config.data_dir).await?;
    let provider = CartProvider::mount(storage, config).await?;
    let cart = provider.handle();

    let state = match command {
        CartCommand::Show => cart.products()?,
        CartCommand::Add(item) => cart.add_to_cart(item)?,
        CartCommand::Increment(id) => cart.increment(&id)?,
        CartCommand::Decrement(id) => cart.decrement(&id)?,
        CartCommand::Clear => cart.clear()?,
    };

    provider.unmount().await?;
    info!(lines = state.len(), "Command complete");
    Ok(state)
}
