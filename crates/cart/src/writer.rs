//! Single-writer persistence queue.
//!
//! All cart writes go through one background task. Mutations hand it the
//! newest snapshot through a `watch` channel, which only ever holds the latest
//! value: snapshots that were not picked up yet are superseded rather than
//! queued. Only one write is in flight at a time, so the stored payload always
//! converges to the most recent in-memory state.
//!
//! Each submitted snapshot carries a generation number. Callers that need to
//! know the write landed wait for the writer to complete that generation (or a
//! later one) with [`PersistWriter::flush`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, instrument, warn};

use crate::codec;
use crate::error::CartError;
use crate::state::CartState;
use crate::storage::KeyValueStore;

/// Upper bound on the backoff exponent.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Retry behavior for failed writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32 << attempt.min(MAX_BACKOFF_SHIFT);
        self.backoff.saturating_mul(factor)
    }
}

/// Progress reported by the writer task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Last generation the writer finished with, successfully or not.
    pub completed: u64,
    /// Error of that write, if it failed.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
struct Pending {
    generation: u64,
    state: CartState,
}

enum WriteOutcome {
    Written,
    Superseded,
    Failed(String),
}

/// Handle to the background writer task.
///
/// Dropping the handle lets the task write whatever is still pending and
/// then stop.
#[derive(Debug)]
pub struct PersistWriter {
    pending: watch::Sender<Pending>,
    status: watch::Receiver<PersistStatus>,
}

impl PersistWriter {
    /// Spawn the writer task.
    ///
    /// `initial` is the state already in storage (generation zero); it is not
    /// written again.
    pub fn spawn<S: KeyValueStore>(
        storage: Arc<S>,
        key: String,
        retry: RetryPolicy,
        initial: CartState,
    ) -> Self {
        let (pending_tx, pending_rx) = watch::channel(Pending {
            generation: 0,
            state: initial,
        });
        let (status_tx, status_rx) = watch::channel(PersistStatus::default());

        tokio::spawn(run(storage, key, retry, pending_rx, status_tx));

        Self {
            pending: pending_tx,
            status: status_rx,
        }
    }

    /// Hand a new snapshot to the writer, replacing any not yet written.
    ///
    /// Generations must be submitted in increasing order.
    pub fn submit(&self, generation: u64, state: CartState) {
        self.pending.send_replace(Pending { generation, state });
    }

    /// Current writer progress.
    #[must_use]
    pub fn status(&self) -> PersistStatus {
        self.status.borrow().clone()
    }

    /// Wait until `generation` (or a later one) has been written.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persist` if the write that completed the wait
    /// failed, or `CartError::WriterClosed` if the writer task is gone.
    pub async fn flush(&self, generation: u64) -> Result<(), CartError> {
        let mut status = self.status.clone();
        let last_error = status
            .wait_for(|s| s.completed >= generation)
            .await
            .map_err(|_| CartError::WriterClosed)?
            .last_error
            .clone();

        match last_error {
            Some(e) => Err(CartError::Persist(e)),
            None => Ok(()),
        }
    }
}

#[instrument(skip_all, fields(key = %key))]
async fn run<S: KeyValueStore>(
    storage: Arc<S>,
    key: String,
    retry: RetryPolicy,
    mut pending: watch::Receiver<Pending>,
    status: watch::Sender<PersistStatus>,
) {
    debug!("Cart writer started");

    while pending.changed().await.is_ok() {
        let Pending { generation, state } = pending.borrow_and_update().clone();

        match write(storage.as_ref(), &key, &state, retry, &pending).await {
            WriteOutcome::Written => {
                debug!(generation, lines = state.len(), "Cart persisted");
                status.send_replace(PersistStatus {
                    completed: generation,
                    last_error: None,
                });
            }
            WriteOutcome::Superseded => {
                debug!(generation, "Cart write superseded by newer state");
            }
            WriteOutcome::Failed(e) => {
                status.send_replace(PersistStatus {
                    completed: generation,
                    last_error: Some(e),
                });
            }
        }
    }

    debug!("Cart writer stopped");
}

/// Write one snapshot, retrying with exponential backoff.
///
/// Gives up early if a newer snapshot arrives while backing off.
async fn write<S: KeyValueStore>(
    storage: &S,
    key: &str,
    state: &CartState,
    retry: RetryPolicy,
    pending: &watch::Receiver<Pending>,
) -> WriteOutcome {
    let payload = match codec::encode(state.items()) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "Failed to encode cart");
            return WriteOutcome::Failed(e.to_string());
        }
    };

    let mut attempt = 0;
    loop {
        match storage.set(key, &payload).await {
            Ok(()) => return WriteOutcome::Written,
            Err(e) if attempt < retry.max_retries => {
                let delay = retry.delay_for(attempt);
                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Cart write failed, retrying"
                );
                tokio::time::sleep(delay).await;
                if pending.has_changed().unwrap_or(false) {
                    return WriteOutcome::Superseded;
                }
                attempt += 1;
            }
            Err(e) => {
                error!(error = %e, attempts = attempt + 1, "Giving up on cart write");
                return WriteOutcome::Failed(e.to_string());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use go_marketplace_core::NewCartItem;

    use super::*;
    use crate::policy::DuplicatePolicy;
    use crate::storage::{MemoryStore, StorageError};

    const KEY: &str = "@GoMarketplace:cart";

    /// Store that fails the first `failures` writes.
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicU32,
        attempts: AtomicU32,
    }

    impl FlakyStore {
        fn new(inner: MemoryStore, failures: u32) -> Self {
            Self {
                inner,
                failures: AtomicU32::new(failures),
                attempts: AtomicU32::new(0),
            }
        }
    }

    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(StorageError::Unavailable("flaky".to_string()));
            }
            self.inner.set(key, value).await
        }
    }

    fn one_shirt() -> CartState {
        CartState::empty().with_added(NewCartItem::new("p1", "Shirt", "u", 10), DuplicatePolicy::Append)
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let retry = RetryPolicy {
            max_retries: 5,
            backoff: Duration::from_millis(10),
        };
        assert_eq!(retry.delay_for(0), Duration::from_millis(10));
        assert_eq!(retry.delay_for(1), Duration::from_millis(20));
        assert_eq!(retry.delay_for(3), Duration::from_millis(80));
        assert_eq!(retry.delay_for(1000), retry.delay_for(MAX_BACKOFF_SHIFT));
    }

    #[tokio::test]
    async fn test_flush_writes_latest_state() {
        let memory = MemoryStore::new();
        let writer = PersistWriter::spawn(
            Arc::new(memory.clone()),
            KEY.to_string(),
            RetryPolicy::default(),
            CartState::empty(),
        );

        let state = one_shirt();
        writer.submit(1, state.clone());
        writer.flush(1).await.unwrap();

        let stored = memory.value(KEY).unwrap();
        assert_eq!(codec::decode(&stored).unwrap(), state.to_vec());
        assert_eq!(writer.status().completed, 1);
    }

    #[tokio::test]
    async fn test_flush_generation_zero_is_immediate() {
        let memory = MemoryStore::new();
        let writer = PersistWriter::spawn(
            Arc::new(memory.clone()),
            KEY.to_string(),
            RetryPolicy::default(),
            CartState::empty(),
        );

        writer.flush(0).await.unwrap();
        assert_eq!(memory.value(KEY), None);
    }

    #[tokio::test]
    async fn test_burst_converges_to_last_submission() {
        let memory = MemoryStore::new();
        let writer = PersistWriter::spawn(
            Arc::new(memory.clone()),
            KEY.to_string(),
            RetryPolicy::default(),
            CartState::empty(),
        );

        let mut state = one_shirt();
        for generation in 1..=50 {
            state = state.with_incremented("p1");
            writer.submit(generation, state.clone());
        }
        writer.flush(50).await.unwrap();

        let stored = codec::decode(&memory.value(KEY).unwrap()).unwrap();
        assert_eq!(stored, state.to_vec());
        assert_eq!(stored[0].quantity, 51);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let memory = MemoryStore::new();
        let flaky = Arc::new(FlakyStore::new(memory.clone(), 2));
        let writer = PersistWriter::spawn(
            Arc::clone(&flaky),
            KEY.to_string(),
            fast_retry(3),
            CartState::empty(),
        );

        writer.submit(1, one_shirt());
        writer.flush(1).await.unwrap();

        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 3);
        assert!(memory.value(KEY).is_some());
    }

    #[tokio::test]
    async fn test_reports_exhausted_retries() {
        let memory = MemoryStore::new();
        let flaky = Arc::new(FlakyStore::new(memory.clone(), 10));
        let writer = PersistWriter::spawn(
            Arc::clone(&flaky),
            KEY.to_string(),
            fast_retry(2),
            CartState::empty(),
        );

        writer.submit(1, one_shirt());
        let err = writer.flush(1).await.unwrap_err();

        assert!(matches!(err, CartError::Persist(_)));
        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(memory.value(KEY), None);
        assert!(writer.status().last_error.is_some());
    }

    #[tokio::test]
    async fn test_later_success_clears_error() {
        let memory = MemoryStore::new();
        let flaky = Arc::new(FlakyStore::new(memory.clone(), 1));
        let writer = PersistWriter::spawn(
            Arc::clone(&flaky),
            KEY.to_string(),
            RetryPolicy::none(),
            CartState::empty(),
        );

        let state = one_shirt();
        writer.submit(1, state.clone());
        assert!(writer.flush(1).await.is_err());

        let state = state.with_incremented("p1");
        writer.submit(2, state.clone());
        writer.flush(2).await.unwrap();

        let stored = codec::decode(&memory.value(KEY).unwrap()).unwrap();
        assert_eq!(stored, state.to_vec());
    }

    #[tokio::test]
    async fn test_dropped_writer_drains_pending_state() {
        let memory = MemoryStore::new();
        let writer = PersistWriter::spawn(
            Arc::new(memory.clone()),
            KEY.to_string(),
            RetryPolicy::default(),
            CartState::empty(),
        );

        writer.submit(1, one_shirt());
        drop(writer);

        for _ in 0..100 {
            if memory.value(KEY).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(memory.value(KEY).is_some());
    }
}
