//! Per-key async mutual exclusion.
//!
//! [`KeyLocks`] serializes multi-step operations that must appear atomic
//! for one key but span more than one store (for example replacing a link
//! policy and revoking every token derived from it).

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// Guard for one locked key. The key is released on drop, and its table
/// entry is removed once nobody else holds or waits on it.
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockTable>,
}

impl KeyGuard {
    /// The locked key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Clones are taken under the shard lock, so a count of one means
        // the table holds the only reference.
        self.table
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish()
    }
}

/// A set of named async mutexes. Entries exist only while some caller
/// holds or waits on the key.
#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Arc<LockTable>,
}

impl KeyLocks {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let lock = self
            .table
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // The map shard is released before awaiting.
        let guard = lock.lock_owned().await;
        trace!(key, "Key locked");
        KeyGuard {
            key: key.to_owned(),
            guard: Some(guard),
            table: Arc::clone(&self.table),
        }
    }

    /// Lock every key in `keys`, in sorted order with duplicates removed, so
    /// two callers locking overlapping sets cannot deadlock.
    pub async fn lock_many<I, S>(&self, keys: I) -> Vec<KeyGuard>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_owned()).collect();
        keys.sort_unstable();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no key is held or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
