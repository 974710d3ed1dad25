//! Policy and claim error types.

use shlink_storage::StorageError;

/// Why a claim on a shared link was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// No policy is registered under this link id.
    #[error("unknown link: {link_id}")]
    UnknownLink {
        /// The requested link id.
        link_id: String,
    },

    /// The link has been deactivated.
    #[error("link is inactive: {link_id}")]
    LinkInactive {
        /// The requested link id.
        link_id: String,
    },

    /// The supplied PIN was missing or wrong.
    #[error("PIN mismatch for link {link_id} ({failures} consecutive failures)")]
    PinMismatch {
        /// The requested link id.
        link_id: String,
        /// Consecutive failures including this one.
        failures: u32,
        /// Whether this failure deactivated the link.
        locked_out: bool,
    },

    /// Every claim the link allows has been made.
    #[error("claim limit of {claim_limit} reached for link {link_id}")]
    ClaimLimitReached {
        /// The requested link id.
        link_id: String,
        /// The link's claim limit.
        claim_limit: u32,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClaimError {
    /// Whether this is an explicit refusal of an existing link, as opposed
    /// to an unknown link or a backend fault.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::LinkInactive { .. } | Self::PinMismatch { .. } | Self::ClaimLimitReached { .. }
        )
    }
}

/// Errors from the link registry and policy engine.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Link terms failed validation.
    #[error("invalid link terms: {reason}")]
    InvalidTerms {
        /// What was wrong.
        reason: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
