//! Resource access gate.
//!
//! The last check before a resource collaborator runs: the presented token
//! must be valid and must carry an item of the required type that lists the
//! requested location by exact string equality.

use shlink_core::AccessType;
use tracing::debug;

use crate::error::{CapabilityError, CapabilityResult};
use crate::store::Introspection;
use crate::token::AccessToken;

/// Checks that tokens cover the resources they are used on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceAccessGate;

impl ResourceAccessGate {
    /// Check an introspection result.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::TokenExpired`] for a known but expired
    /// token and [`CapabilityError::AccessDenied`] for an unknown token or
    /// one without a covering item.
    pub fn check<'t>(
        introspection: &'t Introspection,
        required: AccessType,
        location: &str,
    ) -> CapabilityResult<&'t AccessToken> {
        let denied = || CapabilityError::AccessDenied {
            required,
            location: location.to_owned(),
        };

        let token = introspection.token.as_ref().ok_or_else(denied)?;
        if !introspection.valid {
            return Err(CapabilityError::TokenExpired {
                token: token.fingerprint(),
            });
        }
        if !token.grants(required, location) {
            debug!(
                token = %token.fingerprint(),
                %required,
                location,
                "Token does not cover location"
            );
            return Err(denied());
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AccessTokenStore;
    use shlink_core::{ClientIdentity, ManualClock, PolicyRecord, RarItem};
    use shlink_crypto::KeyPair;

    const FILE: &str = "https://example.org/shclinks/key/pkg/data/x.json";

    fn issue(store: &AccessTokenStore, items: Vec<RarItem>) -> AccessToken {
        let client = ClientIdentity::from_public_key(KeyPair::generate().export_public_key());
        store
            .save(items, vec![PolicyRecord::claim("pkg")], client)
            .unwrap()
    }

    fn check(
        store: &AccessTokenStore,
        value: &str,
        required: AccessType,
        location: &str,
    ) -> CapabilityResult<AccessToken> {
        let introspection = store.introspect(value).unwrap();
        ResourceAccessGate::check(&introspection, required, location).cloned()
    }

    #[test]
    fn test_exact_location_allowed() {
        let store = AccessTokenStore::in_memory();
        let token = issue(&store, vec![RarItem::read([FILE])]);

        let granted = check(&store, &token.value, AccessType::Read, FILE).unwrap();
        assert_eq!(granted.value, token.value);
    }

    #[test]
    fn test_one_character_off_denied() {
        let store = AccessTokenStore::in_memory();
        let token = issue(&store, vec![RarItem::read([FILE])]);

        for near_miss in [
            "http://example.org/shclinks/key/pkg/data/x.json",
            "https://Example.org/shclinks/key/pkg/data/x.json",
            "https://example.org/shclinks/key/pkg/data/x.jsonx",
            "https://example.org/shclinks/key/pkg/data/X.json",
            "https://example.org/shclinks/key/pkg/data/",
            "https://example.org/shclinks/key/pkg/data/x.json/",
        ] {
            let result = check(&store, &token.value, AccessType::Read, near_miss);
            assert!(
                matches!(result, Err(CapabilityError::AccessDenied { .. })),
                "{near_miss} should be denied"
            );
        }
    }

    #[test]
    fn test_wrong_type_denied() {
        let store = AccessTokenStore::in_memory();
        let token = issue(&store, vec![RarItem::new(AccessType::Modify, [FILE])]);

        assert!(matches!(
            check(&store, &token.value, AccessType::Read, FILE),
            Err(CapabilityError::AccessDenied { .. })
        ));
    }

    #[test]
    fn test_expired_and_unknown_tokens() {
        let clock = ManualClock::new(0);
        let store = AccessTokenStore::in_memory().with_clock(clock.shared());
        let token = issue(&store, vec![RarItem::read([FILE])]);

        clock.advance(store.ttl_secs());
        assert!(matches!(
            check(&store, &token.value, AccessType::Read, FILE),
            Err(CapabilityError::TokenExpired { .. })
        ));
        assert!(matches!(
            check(&store, "unknown", AccessType::Read, FILE),
            Err(CapabilityError::AccessDenied { .. })
        ));
        assert!(matches!(
            ResourceAccessGate::check(&Introspection::unknown(), AccessType::Read, FILE),
            Err(CapabilityError::AccessDenied { .. })
        ));
    }
}
