//! Keyed record stores.
//!
//! [`KeyedStore`] is the storage seam for every table of shared state
//! (tokens, link policies). Besides plain `get`/`put`/`delete` it exposes
//! [`update`](KeyedStore::update), which runs a closure against the stored
//! value while no other writer can touch that key. Check-and-mutate logic
//! belongs inside that closure, never in a separate read followed by a write.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{StorageError, StorageResult};

/// A table of `V` records addressed by string keys.
pub trait KeyedStore<V>: Send + Sync {
    /// Snapshot of the value at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyKey`] for an empty key.
    fn get(&self, key: &str) -> StorageResult<Option<V>>;

    /// Store `value` at `key`, returning the value it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyKey`] for an empty key.
    fn put(&self, key: &str, value: V) -> StorageResult<Option<V>>;

    /// Store `value` at `key` only if the key is vacant. Returns the value
    /// already present, in which case nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyKey`] for an empty key.
    fn put_if_absent(&self, key: &str, value: V) -> StorageResult<Option<V>>;

    /// Remove `key`, returning its value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyKey`] for an empty key.
    fn delete(&self, key: &str) -> StorageResult<Option<V>>;

    /// Run `f` on the value at `key` atomically with respect to every other
    /// operation on that key. Returns `false` when the key is absent.
    ///
    /// `f` must not block or re-enter the store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyKey`] for an empty key.
    fn update(&self, key: &str, f: &mut dyn FnMut(&mut V)) -> StorageResult<bool>;

    /// Keep only the entries for which `keep` returns `true`. Returns the
    /// number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn retain(&self, keep: &mut dyn FnMut(&str, &V) -> bool) -> StorageResult<usize>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `f` once against the value at `key` under [`KeyedStore::update`],
/// returning its result, or `None` if the key is absent.
///
/// # Errors
///
/// Propagates errors from the store.
pub fn modify<V, R>(
    store: &dyn KeyedStore<V>,
    key: &str,
    f: impl FnOnce(&mut V) -> R,
) -> StorageResult<Option<R>> {
    let mut f = Some(f);
    let mut out = None;
    store.update(key, &mut |value| {
        if let Some(f) = f.take() {
            out = Some(f(value));
        }
    })?;
    Ok(out)
}

fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::EmptyKey);
    }
    Ok(())
}

/// In-memory [`KeyedStore`] on a sharded concurrent map.
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: DashMap<String, V>,
}

impl<V> MemoryStore<V> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> KeyedStore<V> for MemoryStore<V> {
    fn get(&self, key: &str) -> StorageResult<Option<V>> {
        validate_key(key)?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: &str, value: V) -> StorageResult<Option<V>> {
        validate_key(key)?;
        Ok(self.entries.insert(key.to_owned(), value))
    }

    fn put_if_absent(&self, key: &str, value: V) -> StorageResult<Option<V>> {
        validate_key(key)?;
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(occupied) => Ok(Some(occupied.get().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(None)
            },
        }
    }

    fn delete(&self, key: &str) -> StorageResult<Option<V>> {
        validate_key(key)?;
        Ok(self.entries.remove(key).map(|(_, value)| value))
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(&mut V)) -> StorageResult<bool> {
        validate_key(key)?;
        // The entry holds the shard write lock until it is dropped.
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                f(occupied.get_mut());
                Ok(true)
            },
            Entry::Vacant(_) => Ok(false),
        }
    }

    fn retain(&self, keep: &mut dyn FnMut(&str, &V) -> bool) -> StorageResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|key, value| keep(key, value));
        Ok(before.saturating_sub(self.entries.len()))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
