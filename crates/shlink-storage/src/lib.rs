//! Shlink Storage - Keyed stores for shared authorization state.
//!
//! # Stores ([`KeyedStore`])
//!
//! A table of records addressed by string keys, with a per-key atomic
//! [`update`](KeyedStore::update) for check-and-mutate logic.
//! [`MemoryStore`] is the in-memory backend.
//!
//! # Key locks ([`KeyLocks`])
//!
//! Async mutexes keyed by name, for operations that must be serialized per
//! key across more than one store.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod kv;
pub mod locks;

pub use error::{StorageError, StorageResult};
pub use kv::{KeyedStore, MemoryStore, modify};
pub use locks::{KeyGuard, KeyLocks};
