//! Cart error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by the cart store and its handles.
#[derive(Debug, Error)]
pub enum CartError {
    /// A handle was used with no mounted provider behind it.
    #[error("Cart used outside of a mounted CartProvider")]
    OutOfScope,

    /// Reading the stored cart failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The latest cart state could not be written, even after retries.
    #[error("Failed to persist cart: {0}")]
    Persist(String),

    /// The background writer is gone.
    #[error("Cart writer stopped")]
    WriterClosed,
}
