//! Detached Ed25519 signatures, as carried in the third segment of a
//! compact JWS.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use std::fmt;

use crate::encoding::{b64url_decode, b64url_encode};
use crate::error::{CryptoError, CryptoResult};

const SIGNATURE_LEN: usize = 64;

/// A 64 byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignatureLength`] unless `slice` is 64
    /// bytes.
    pub fn try_from_slice(slice: &[u8]) -> CryptoResult<Self> {
        slice
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidSignatureLength {
                expected: SIGNATURE_LEN,
                actual: slice.len(),
            })
    }

    /// Raw signature bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; SIGNATURE_LEN] {
        self.0
    }

    /// The JWS signature segment.
    #[must_use]
    pub fn to_base64url(&self) -> String {
        b64url_encode(self.0)
    }

    /// Parse a JWS signature segment.
    ///
    /// # Errors
    ///
    /// Fails on bad base64url or a length other than 64 bytes.
    pub fn from_base64url(segment: &str) -> CryptoResult<Self> {
        Self::try_from_slice(&b64url_decode(segment)?)
    }

    /// Strict verification: small-order keys and non-canonical `S` values
    /// are rejected along with plain mismatches.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] when `public_key` is not a
    /// point, otherwise [`CryptoError::SignatureVerificationFailed`].
    pub fn verify(&self, message: &[u8], public_key: &[u8; 32]) -> CryptoResult<()> {
        VerifyingKey::from_bytes(public_key)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?
            .verify_strict(message, &DalekSignature::from_bytes(&self.0))
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl From<[u8; SIGNATURE_LEN]> for Signature {
    fn from(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<DalekSignature> for Signature {
    fn from(sig: DalekSignature) -> Self {
        Self(sig.to_bytes())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.to_base64url();
        write!(f, "Signature({}..)", encoded.get(..12).unwrap_or(&encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_segment_decodes_to_verifiable_signature() {
        let keypair = KeyPair::generate();
        let segment = keypair.sign(b"header.payload").to_base64url();

        let sig = Signature::from_base64url(&segment).unwrap();
        sig.verify(b"header.payload", keypair.public_key_bytes())
            .unwrap();
    }

    #[test]
    fn test_short_signature_rejected() {
        assert!(matches!(
            Signature::try_from_slice(&[0u8; 63]),
            Err(CryptoError::InvalidSignatureLength {
                expected: 64,
                actual: 63
            })
        ));
        assert!(Signature::from_base64url("AAAA").is_err());
    }

    #[test]
    fn test_any_flipped_bit_fails() {
        let keypair = KeyPair::generate();
        let original = keypair.sign(b"header.payload").to_bytes();

        for byte in [0, 31, 32, 63] {
            let mut bytes = original;
            bytes[byte] ^= 0x80;
            assert!(
                Signature::from(bytes)
                    .verify(b"header.payload", keypair.public_key_bytes())
                    .is_err()
            );
        }
    }
}
