//! Directory-backed storage backend.
//!
//! Each key maps to one file inside the data directory. Writes go to a
//! uniquely named temporary file first and are then renamed over the target,
//! so readers only ever see a complete payload.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use uuid::Uuid;

use super::{KeyValueStore, StorageError};

/// File extension for stored values.
const VALUE_EXTENSION: &str = "json";

/// Key-value store persisting each key as a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{VALUE_EXTENSION}", file_stem(key)))
    }
}

/// Map a storage key to a file name stem.
///
/// ASCII alphanumerics, `-`, `_` and `.` are kept; everything else becomes `_`.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl KeyValueStore for FileStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", file_stem(key), Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&tmp, value).await {
            return Err(StorageError::io(tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            // Best effort: the temp file is useless once the rename failed
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::io(path, e));
        }
        Ok(())
    }
}
