//! Errors raised by keyed stores.

use thiserror::Error;

/// Why a store refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Records are never addressed by the empty string.
    #[error("store keys must be non-empty")]
    EmptyKey,
}

/// Result of a store operation.
pub type StorageResult<T> = Result<T, StorageError>;
