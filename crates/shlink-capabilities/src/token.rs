//! Access tokens.
//!
//! An access token is an opaque bearer value. It is only usable together
//! with a request signed by the key it was bound to at issuance.

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use shlink_core::{AccessType, ClientIdentity, PolicyRecord, RarItem};
use shlink_crypto::{access_token_hash, b64url_encode};
use std::fmt;

use crate::error::{CapabilityError, CapabilityResult};

/// Number of random bytes in a token value.
pub const TOKEN_VALUE_BYTES: usize = 32;

/// Generate an unguessable token value from the OS random source.
///
/// # Errors
///
/// Returns [`CapabilityError::TokenGeneration`] if the OS random source fails.
pub fn generate_token_value() -> CapabilityResult<String> {
    let mut bytes = [0u8; TOKEN_VALUE_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CapabilityError::TokenGeneration(e.to_string()))?;
    Ok(b64url_encode(bytes))
}

/// Short, non-reversible label for a token value, safe to log.
#[must_use]
pub fn token_fingerprint(value: &str) -> String {
    access_token_hash(value).chars().take(10).collect()
}

/// An issued access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer value.
    pub value: String,
    /// The client the token is bound to.
    pub bound_client: ClientIdentity,
    /// Rights the token carries.
    pub granted_access: Vec<RarItem>,
    /// Policies the rights were granted under.
    pub enabling_policies: Vec<PolicyRecord>,
    /// Expiry, epoch seconds.
    pub expiration_time: i64,
}

impl AccessToken {
    /// Whether the token can still be used at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expiration_time > now
    }

    /// Whether some granted item of `access_type` lists `location` verbatim.
    #[must_use]
    pub fn grants(&self, access_type: AccessType, location: &str) -> bool {
        self.granted_access
            .iter()
            .any(|item| item.covers(access_type, location))
    }

    /// Whether any right was granted under a claim on `package`.
    #[must_use]
    pub fn derives_from_claim_on(&self, package: &str) -> bool {
        self.enabling_policies
            .iter()
            .any(|record| record.is_claim_on(package))
    }

    /// Loggable label for this token.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        token_fingerprint(&self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("fingerprint", &self.fingerprint())
            .field("bound_client", self.bound_client.key_id())
            .field("granted_access", &self.granted_access)
            .field("enabling_policies", &self.enabling_policies)
            .field("expiration_time", &self.expiration_time)
            .finish()
    }
}
