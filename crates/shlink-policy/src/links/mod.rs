//! Shared links and their claim terms.
//!
//! A [`LinkPolicy`] is the single source of truth for how a package may be
//! claimed: an optional PIN, a claim limit, and the read rights a
//! successful claim receives. The [`LinkRegistry`] owns every policy and
//! performs claims as atomic check-and-append operations.

mod registry;

pub use registry::LinkRegistry;

use serde::{Deserialize, Serialize};
use shlink_core::{ClientIdentity, RarItem};
use std::fmt;

/// Consecutive PIN failures that deactivate a link.
pub const DEFAULT_PIN_LOCKOUT_THRESHOLD: u32 = 5;

/// Terms a package owner publishes for a link.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTerms {
    /// PIN claimants must supply, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    /// Maximum number of successful claims.
    pub claim_limit: u32,
    /// Read rights each claimant receives.
    pub granted_access: Vec<RarItem>,
}

impl fmt::Debug for LinkTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkTerms")
            .field("pin", &self.pin.as_ref().map(|_| "<redacted>"))
            .field("claim_limit", &self.claim_limit)
            .field("granted_access", &self.granted_access)
            .finish()
    }
}

/// One successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Whether the claim still stands.
    pub active: bool,
    /// Who claimed.
    pub client: ClientIdentity,
}

/// The current sharing state of a package.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPolicy {
    /// Link id (the package id).
    pub id: String,
    /// PIN claimants must supply, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    /// Maximum number of successful claims.
    pub claim_limit: u32,
    /// Successful claims so far. Never longer than `claim_limit`.
    pub claims: Vec<Claim>,
    /// Consecutive PIN failures.
    pub failures: u32,
    /// Whether the link can still be claimed.
    pub active: bool,
    /// Read rights each claimant receives.
    pub granted_access: Vec<RarItem>,
}

impl LinkPolicy {
    /// A fresh policy for `id` under `terms`.
    #[must_use]
    pub fn new(id: impl Into<String>, terms: LinkTerms) -> Self {
        Self {
            id: id.into(),
            pin: terms.pin,
            claim_limit: terms.claim_limit,
            claims: Vec::new(),
            failures: 0,
            active: true,
            granted_access: terms.granted_access,
        }
    }

    /// Claims still available.
    #[must_use]
    pub fn remaining_claims(&self) -> u32 {
        let used = u32::try_from(self.claims.len()).unwrap_or(u32::MAX);
        self.claim_limit.saturating_sub(used)
    }

    /// Whether a PIN is required.
    #[must_use]
    pub fn needs_pin(&self) -> bool {
        self.pin.is_some()
    }
}

impl fmt::Debug for LinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkPolicy")
            .field("id", &self.id)
            .field("pin", &self.pin.as_ref().map(|_| "<redacted>"))
            .field("claim_limit", &self.claim_limit)
            .field("claims", &self.claims.len())
            .field("failures", &self.failures)
            .field("active", &self.active)
            .field("granted_access", &self.granted_access)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_policy_is_fresh() {
        let policy = LinkPolicy::new(
            "pkg",
            LinkTerms {
                pin: Some("1234".to_owned()),
                claim_limit: 3,
                granted_access: vec![RarItem::read(["u"])],
            },
        );
        assert!(policy.active);
        assert!(policy.needs_pin());
        assert_eq!(policy.failures, 0);
        assert_eq!(policy.remaining_claims(), 3);
    }

    #[test]
    fn test_debug_redacts_pin() {
        let terms = LinkTerms {
            pin: Some("987654".to_owned()),
            claim_limit: 1,
            granted_access: vec![],
        };
        assert!(!format!("{terms:?}").contains("987654"));
        assert!(!format!("{:?}", LinkPolicy::new("p", terms)).contains("987654"));
    }
}
