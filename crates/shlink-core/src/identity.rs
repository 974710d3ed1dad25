//! Client identity as established by a verified request signature.

use serde::{Deserialize, Serialize};
use shlink_crypto::{CryptoResult, Jwk, KeyThumbprint, PublicKey};

/// A client, identified by its public signing key.
///
/// The key id is always the RFC 7638 thumbprint of the key, never a
/// self-declared `kid`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity {
    key_id: KeyThumbprint,
    public_key: PublicKey,
}

impl ClientIdentity {
    /// Identity for a public key.
    #[must_use]
    pub fn from_public_key(public_key: PublicKey) -> Self {
        Self {
            key_id: public_key.thumbprint(),
            public_key,
        }
    }

    /// Identity for a JWK.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK is not a valid Ed25519 public key.
    pub fn from_jwk(jwk: &Jwk) -> CryptoResult<Self> {
        jwk.public_key().map(Self::from_public_key)
    }

    /// The key thumbprint.
    #[must_use]
    pub fn key_id(&self) -> &KeyThumbprint {
        &self.key_id
    }

    /// The public key.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The public key as a JWK carrying the thumbprint as `kid`.
    #[must_use]
    pub fn jwk(&self) -> Jwk {
        Jwk::from_public_key(&self.public_key)
    }
}
