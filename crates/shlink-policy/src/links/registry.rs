//! The link registry.

use shlink_core::{AccessType, ClientIdentity, RarItem};
use shlink_crypto::{KeyThumbprint, constant_time_eq};
use shlink_storage::{KeyGuard, KeyLocks, KeyedStore, MemoryStore, modify};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Claim, DEFAULT_PIN_LOCKOUT_THRESHOLD, LinkPolicy, LinkTerms};
use crate::error::{ClaimError, PolicyError, PolicyResult};

/// Owner of every link policy.
///
/// [`claim`](Self::claim) runs under the store's per-key atomic update, so
/// two concurrent claims can never both take the last slot. The per-link
/// async [`lock`](Self::lock) serializes longer sequences (a claim and the
/// storing of its token; a policy replacement and its cascading revocation).
pub struct LinkRegistry {
    links: Arc<dyn KeyedStore<LinkPolicy>>,
    owners: Arc<dyn KeyedStore<KeyThumbprint>>,
    locks: KeyLocks,
    lockout_threshold: u32,
    max_claim_limit: Option<u32>,
}

impl LinkRegistry {
    /// Empty in-memory registry with default limits.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_stores(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Registry backed by existing policy and ownership tables.
    #[must_use]
    pub fn with_stores(
        links: Arc<dyn KeyedStore<LinkPolicy>>,
        owners: Arc<dyn KeyedStore<KeyThumbprint>>,
    ) -> Self {
        Self {
            links,
            owners,
            locks: KeyLocks::new(),
            lockout_threshold: DEFAULT_PIN_LOCKOUT_THRESHOLD,
            max_claim_limit: None,
        }
    }

    /// Set the number of consecutive PIN failures that deactivate a link.
    #[must_use]
    pub fn with_lockout_threshold(mut self, threshold: u32) -> Self {
        self.lockout_threshold = threshold.max(1);
        self
    }

    /// Cap the claim limit a link may be given. Uncapped unless set.
    #[must_use]
    pub fn with_max_claim_limit(mut self, max: Option<u32>) -> Self {
        self.max_claim_limit = max.map(|max| max.max(1));
        self
    }

    /// The PIN lockout threshold.
    #[must_use]
    pub fn lockout_threshold(&self) -> u32 {
        self.lockout_threshold
    }

    /// Replace the policy for `link_id`, starting with no claims and no
    /// PIN failures.
    ///
    /// Containment of `granted_access` in the package's namespace is the
    /// caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidTerms`] for a claim limit of zero or
    /// above the configured cap, an empty PIN, or a granted item that is not
    /// `read`.
    pub fn put(&self, link_id: &str, terms: LinkTerms) -> PolicyResult<LinkPolicy> {
        self.validate_terms(&terms)?;

        let policy = LinkPolicy::new(link_id, terms);
        let replaced = self.links.put(link_id, policy.clone())?;

        info!(
            link_id,
            claim_limit = policy.claim_limit,
            needs_pin = policy.needs_pin(),
            items = policy.granted_access.len(),
            replaced = replaced.is_some(),
            "Link policy stored"
        );
        Ok(policy)
    }

    fn validate_terms(&self, terms: &LinkTerms) -> PolicyResult<()> {
        let invalid = |reason: String| Err(PolicyError::InvalidTerms { reason });

        if terms.claim_limit == 0 {
            return invalid("claim limit must be at least 1".to_owned());
        }
        if let Some(max) = self.max_claim_limit
            && terms.claim_limit > max
        {
            return invalid(format!(
                "claim limit {} exceeds this server's cap of {max}",
                terms.claim_limit
            ));
        }
        if terms.pin.as_deref().is_some_and(str::is_empty) {
            return invalid("PIN must not be empty".to_owned());
        }
        if let Some(item) = terms
            .granted_access
            .iter()
            .find(|item| item.access_type != AccessType::Read)
        {
            return invalid(format!("links may only grant read access, got {}", item.access_type));
        }
        Ok(())
    }

    /// Claim `link_id` for `client`, returning the rights granted.
    ///
    /// Checked in order: the link is active; the PIN (if set) matches, where
    /// a mismatch counts toward lockout and a match resets the count; a
    /// claim slot is free.
    ///
    /// # Errors
    ///
    /// Returns the [`ClaimError`] describing the refusal. A PIN mismatch
    /// still updates the stored failure count.
    pub fn claim(
        &self,
        link_id: &str,
        supplied_pin: Option<&str>,
        client: &ClientIdentity,
    ) -> Result<Vec<RarItem>, ClaimError> {
        let threshold = self.lockout_threshold;
        let outcome = modify(self.links.as_ref(), link_id, |policy| {
            Self::claim_locked(policy, supplied_pin, client, threshold)
        })?;

        let Some(result) = outcome else {
            return Err(ClaimError::UnknownLink {
                link_id: link_id.to_owned(),
            });
        };

        match &result {
            Ok(items) => info!(
                link_id,
                client = %client.key_id(),
                items = items.len(),
                "Link claimed"
            ),
            Err(ClaimError::PinMismatch {
                failures,
                locked_out,
                ..
            }) if *locked_out => warn!(
                link_id,
                failures, "PIN failure limit reached, link deactivated"
            ),
            Err(e) => info!(link_id, client = %client.key_id(), reason = %e, "Claim refused"),
        }
        result
    }

    fn claim_locked(
        policy: &mut LinkPolicy,
        supplied_pin: Option<&str>,
        client: &ClientIdentity,
        threshold: u32,
    ) -> Result<Vec<RarItem>, ClaimError> {
        if !policy.active {
            return Err(ClaimError::LinkInactive {
                link_id: policy.id.clone(),
            });
        }

        if let Some(pin) = &policy.pin {
            let matches = supplied_pin.is_some_and(|supplied| constant_time_eq(supplied, pin));
            if !matches {
                policy.failures = policy.failures.saturating_add(1);
                let locked_out = policy.failures >= threshold;
                if locked_out {
                    policy.active = false;
                }
                return Err(ClaimError::PinMismatch {
                    link_id: policy.id.clone(),
                    failures: policy.failures,
                    locked_out,
                });
            }
            policy.failures = 0;
        }

        if policy.remaining_claims() == 0 {
            return Err(ClaimError::ClaimLimitReached {
                link_id: policy.id.clone(),
                claim_limit: policy.claim_limit,
            });
        }

        policy.claims.push(Claim {
            active: true,
            client: client.clone(),
        });
        Ok(policy.granted_access.clone())
    }

    /// Record `owner` as the only namespace that may publish `link_id`.
    ///
    /// The first owner recorded keeps the id for good. Returns whether that
    /// owner is `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn bind_owner(&self, link_id: &str, owner: &KeyThumbprint) -> PolicyResult<bool> {
        Ok(match self.owners.put_if_absent(link_id, owner.clone())? {
            None => true,
            Some(current) => &current == owner,
        })
    }

    /// Snapshot of the policy for `link_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get(&self, link_id: &str) -> PolicyResult<Option<LinkPolicy>> {
        Ok(self.links.get(link_id)?)
    }

    /// Exclusive access to `link_id` until the guard drops.
    pub async fn lock(&self, link_id: &str) -> KeyGuard {
        self.locks.lock(link_id).await
    }

    /// Exclusive access to several links, acquired in a deadlock-free order.
    pub async fn lock_many<I, S>(&self, link_ids: I) -> Vec<KeyGuard>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.locks.lock_many(link_ids).await
    }

    /// Number of registered links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether no links are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl fmt::Debug for LinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkRegistry")
            .field("links", &self.links.len())
            .field("lockout_threshold", &self.lockout_threshold)
            .field("max_claim_limit", &self.max_claim_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
