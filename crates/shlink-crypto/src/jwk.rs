//! JSON Web Keys for Ed25519 (`kty: "OKP"`, `crv: "Ed25519"`) and their
//! RFC 7638 thumbprints.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};
use crate::hash::ContentHash;
use crate::keypair::PublicKey;

/// JWS algorithm name for Ed25519 signatures.
pub const ALG_EDDSA: &str = "EdDSA";

const KTY_OKP: &str = "OKP";
const CRV_ED25519: &str = "Ed25519";

/// A public JSON Web Key as carried in a GNAP `client.key.jwk` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type.
    pub kty: String,
    /// Curve name.
    pub crv: String,
    /// Base64url public key bytes.
    pub x: String,
    /// Key id declared by the client (informational only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Declared algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Declared key use.
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl Jwk {
    /// Describe a public key, with `kid` set to its thumbprint.
    #[must_use]
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self {
            kty: KTY_OKP.to_owned(),
            crv: CRV_ED25519.to_owned(),
            x: key.to_base64url(),
            kid: Some(key.thumbprint().into_string()),
            alg: Some(ALG_EDDSA.to_owned()),
            key_use: Some("sig".to_owned()),
        }
    }

    /// Decode the verifying key this JWK describes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedKey`] for anything other than an
    /// Ed25519 OKP key, [`CryptoError::UnsupportedAlgorithm`] when `alg` is
    /// declared as something other than `EdDSA`, or a decoding error for `x`.
    pub fn public_key(&self) -> CryptoResult<PublicKey> {
        if self.kty != KTY_OKP || self.crv != CRV_ED25519 {
            return Err(CryptoError::UnsupportedKey {
                kty: self.kty.clone(),
                crv: self.crv.clone(),
            });
        }
        if let Some(alg) = &self.alg
            && alg != ALG_EDDSA
        {
            return Err(CryptoError::UnsupportedAlgorithm(alg.clone()));
        }
        PublicKey::from_base64url(&self.x)
    }

    /// Thumbprint of the key this JWK describes.
    ///
    /// # Errors
    ///
    /// Same as [`Jwk::public_key`].
    pub fn thumbprint(&self) -> CryptoResult<KeyThumbprint> {
        Ok(self.public_key()?.thumbprint())
    }
}

/// RFC 7638 JWK thumbprint: base64url SHA-256 over the canonical
/// `{"crv","kty","x"}` member set.
///
/// The thumbprint is the client's stable key identifier and the root of its
/// namespace. It only contains the base64url alphabet, so it is safe as a
/// URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyThumbprint(String);

impl KeyThumbprint {
    /// Compute the thumbprint of a public key.
    #[must_use]
    pub fn of(key: &PublicKey) -> Self {
        let canonical = format!(
            r#"{{"crv":"{CRV_ED25519}","kty":"{KTY_OKP}","x":"{}"}}"#,
            key.to_base64url()
        );
        Self(ContentHash::hash(canonical.as_bytes()).to_base64url())
    }

    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for KeyThumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for KeyThumbprint {
    /// Wrap a previously computed thumbprint, e.g. one read back from a path.
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for KeyThumbprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
