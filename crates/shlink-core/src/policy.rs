//! Policy records: why a token was granted.

use serde::{Deserialize, Serialize};
use shlink_crypto::KeyThumbprint;

/// Who a policy applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Who {
    /// Any client that presents the link id (and PIN, when set).
    Anyone,
    /// Only the holder of the identified key.
    Keyholder {
        /// Thumbprint of the key.
        key_thumbprint: KeyThumbprint,
    },
}

/// The permission a policy conveys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyPermission {
    /// Permission to create a package.
    Initialize,
    /// Permission to manage the caller's own namespace.
    Manage,
    /// Permission to claim a shared link.
    Claim,
}

/// A record of one policy that enabled a grant.
///
/// Tokens carry these so they can be revoked when the policy they were
/// granted under is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Who the policy applies to.
    pub who: Who,
    /// What it permits.
    pub permission: PolicyPermission,
    /// The package it is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl PolicyRecord {
    /// Anyone-may-initialize policy.
    #[must_use]
    pub fn initialize() -> Self {
        Self {
            who: Who::Anyone,
            permission: PolicyPermission::Initialize,
            package: None,
        }
    }

    /// Keyholder manage policy over the key's own namespace.
    #[must_use]
    pub fn manage(key_thumbprint: KeyThumbprint) -> Self {
        let package = Some(key_thumbprint.as_str().to_owned());
        Self {
            who: Who::Keyholder { key_thumbprint },
            permission: PolicyPermission::Manage,
            package,
        }
    }

    /// Whether this is a claim record for `package`.
    #[must_use]
    pub fn is_claim_on(&self, package: &str) -> bool {
        self.permission == PolicyPermission::Claim && self.is_about(package)
    }

    /// Anyone-may-claim policy for `package`.
    #[must_use]
    pub fn claim(package: impl Into<String>) -> Self {
        Self {
            who: Who::Anyone,
            permission: PolicyPermission::Claim,
            package: Some(package.into()),
        }
    }

    /// Whether this record names `package`.
    #[must_use]
    pub fn is_about(&self, package: &str) -> bool {
        self.package.as_deref() == Some(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_about() {
        let record = PolicyRecord::claim("pkg-1");
        assert!(record.is_about("pkg-1"));
        assert!(!record.is_about("pkg-2"));

        let manage = PolicyRecord::manage(KeyThumbprint::from("k".to_string()));
        assert!(manage.is_about("k"));
        assert!(!manage.is_claim_on("k"));
        assert!(PolicyRecord::claim("k").is_claim_on("k"));
    }

    #[test]
    fn test_serialization_shape() {
        let record = PolicyRecord::claim("pkg-1");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["who"]["type"], "anyone");
        assert_eq!(json["permission"], "claim");
        assert_eq!(json["package"], "pkg-1");
    }
}
