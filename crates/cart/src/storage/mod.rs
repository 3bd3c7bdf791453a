//! Key-value string storage backing the cart.
//!
//! The cart only needs two operations from its backend: read the string under
//! a key, and overwrite the string under a key. Anything that can do that
//! (device local storage, a directory on disk, a test double) implements
//! [`KeyValueStore`].
//!
//! # Backends
//!
//! - [`MemoryStore`] - Process-local map, shared between clones
//! - [`FileStore`] - One file per key inside a data directory

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backend refused or could not service the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Async string store keyed by string.
///
/// `set` replaces any previous value under the key. Implementations must be
/// shareable across tasks because the persistence writer runs in the
/// background.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` if nothing was stored.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Store `value` under `key`, overwriting prior contents.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
