//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CART_DATA_DIR` - Directory for the file store (default: .go-marketplace)
//! - `CART_STORAGE_KEY` - Key the cart is stored under (default: @GoMarketplace:cart)
//! - `CART_DECREMENT_POLICY` - `unclamped`, `clamp` or `remove` (default: unclamped)
//! - `CART_DUPLICATE_POLICY` - `append` or `merge` (default: append)
//! - `CART_PERSIST_MAX_RETRIES` - Retries for a failed write (default: 3)
//! - `CART_PERSIST_BACKOFF_MS` - First retry delay, doubled per retry (default: 50)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::policy::{CartPolicy, DecrementPolicy, DuplicatePolicy};
use crate::writer::RetryPolicy;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace:cart";

/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = ".go-marketplace";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory used by the file-backed store
    pub data_dir: PathBuf,
    /// Key the whole cart payload is stored under
    pub storage_key: String,
    /// Mutation policies
    pub policy: CartPolicy,
    /// Retry behavior of the background writer
    pub persist: RetryPolicy,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            policy: CartPolicy::default(),
            persist: RetryPolicy::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        Ok(Self {
            data_dir: PathBuf::from(env.or_default("CART_DATA_DIR", DEFAULT_DATA_DIR)),
            storage_key: env.or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            policy: CartPolicy {
                decrement: env.parsed::<DecrementPolicy>("CART_DECREMENT_POLICY")?.unwrap_or_default(),
                duplicate: env.parsed::<DuplicatePolicy>("CART_DUPLICATE_POLICY")?.unwrap_or_default(),
            },
            persist: RetryPolicy {
                max_retries: env
                    .parsed::<u32>("CART_PERSIST_MAX_RETRIES")?
                    .unwrap_or(RetryPolicy::default().max_retries),
                backoff: env
                    .parsed::<u64>("CART_PERSIST_BACKOFF_MS")?
                    .map_or(RetryPolicy::default().backoff, Duration::from_millis),
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get and parse an optional variable.
    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }
}
