//! Access token storage.
//!
//! Tokens live in a [`KeyedStore`] keyed by their bearer value. Expiry is
//! checked lazily at introspection; [`AccessTokenStore::cleanup_expired`]
//! is an optional sweep and nothing depends on it having run.

use shlink_core::{ClientIdentity, PolicyRecord, RarItem, SharedClock, SystemClock};
use shlink_storage::{KeyedStore, MemoryStore};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CapabilityResult;
use crate::token::{AccessToken, generate_token_value, token_fingerprint};

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 300;

/// Result of looking a token value up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Introspection {
    /// The stored record, if the value is known.
    pub token: Option<AccessToken>,
    /// Whether the token is known and unexpired.
    pub valid: bool,
}

impl Introspection {
    /// Introspection of an unknown value.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            token: None,
            valid: false,
        }
    }

    /// The token, only if it is valid.
    #[must_use]
    pub fn usable(&self) -> Option<&AccessToken> {
        self.token.as_ref().filter(|_| self.valid)
    }
}

/// Store of issued access tokens.
pub struct AccessTokenStore {
    tokens: Arc<dyn KeyedStore<AccessToken>>,
    clock: SharedClock,
    ttl_secs: i64,
}

impl AccessTokenStore {
    /// In-memory store on the wall clock with the default lifetime.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), SystemClock::shared())
    }

    /// Store backed by an existing table.
    #[must_use]
    pub fn with_store(tokens: Arc<dyn KeyedStore<AccessToken>>, clock: SharedClock) -> Self {
        Self {
            tokens,
            clock,
            ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    /// Set the token lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Token lifetime in seconds.
    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// The clock tokens are checked against.
    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Issue and store a token.
    ///
    /// # Errors
    ///
    /// Returns an error if a token value cannot be generated or the store fails.
    pub fn save(
        &self,
        granted_access: Vec<RarItem>,
        enabling_policies: Vec<PolicyRecord>,
        bound_client: ClientIdentity,
    ) -> CapabilityResult<AccessToken> {
        let token = AccessToken {
            value: generate_token_value()?,
            bound_client,
            granted_access,
            enabling_policies,
            expiration_time: self.clock.now().saturating_add(self.ttl_secs),
        };
        self.tokens.put(&token.value, token.clone())?;

        info!(
            token = %token.fingerprint(),
            client = %token.bound_client.key_id(),
            grants = token.granted_access.len(),
            expires = token.expiration_time,
            "Access token issued"
        );
        Ok(token)
    }

    /// Look a token value up. Unknown values are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn introspect(&self, value: &str) -> CapabilityResult<Introspection> {
        if value.is_empty() {
            return Ok(Introspection::unknown());
        }
        let Some(token) = self.tokens.get(value)? else {
            debug!(token = %token_fingerprint(value), "Unknown access token");
            return Ok(Introspection::unknown());
        };
        let valid = token.is_valid_at(self.clock.now());
        Ok(Introspection {
            token: Some(token),
            valid,
        })
    }

    /// Delete every token granted under a claim on `package`. Returns the
    /// number deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn revoke_by_package(&self, package: &str) -> CapabilityResult<usize> {
        let removed = self
            .tokens
            .retain(&mut |_, token| !token.derives_from_claim_on(package))?;
        info!(package, revoked = removed, "Revoked tokens derived from package");
        Ok(removed)
    }

    /// Delete every expired token. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn cleanup_expired(&self) -> CapabilityResult<usize> {
        let now = self.clock.now();
        let removed = self.tokens.retain(&mut |_, token| token.is_valid_at(now))?;
        if removed > 0 {
            debug!(removed, "Expired tokens swept");
        }
        Ok(removed)
    }

    /// Number of stored tokens, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Debug for AccessTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenStore")
            .field("tokens", &self.tokens.len())
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
