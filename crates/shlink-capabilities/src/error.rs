//! Capability-related error types.

use shlink_core::AccessType;
use thiserror::Error;

/// Errors that can occur with access tokens.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// No access token accompanied the request.
    #[error("no access token presented")]
    TokenNotPresented,

    /// Token has expired.
    #[error("access token expired: {token}")]
    TokenExpired {
        /// Fingerprint of the expired token.
        token: String,
    },

    /// The token does not cover the requested location.
    #[error("access denied: {required} not granted for {location}")]
    AccessDenied {
        /// The access type the operation needs.
        required: AccessType,
        /// The location being accessed.
        location: String,
    },

    /// The OS random source failed.
    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    /// Storage error.
    #[error("storage error: {0}")]
    StorageError(#[from] shlink_storage::StorageError),
}

/// Result type for capability operations.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
