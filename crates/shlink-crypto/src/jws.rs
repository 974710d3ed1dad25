//! Compact JWS carrying a GNAP request-binding header.
//!
//! The protected header binds a signature to one HTTP request: method
//! (`htm`), full URL (`uri`), creation time (`created`) and, when an access
//! token is presented, the token's hash (`ath`). Only `EdDSA` is accepted.

use serde::{Deserialize, Serialize};

use crate::encoding::{b64url_decode, b64url_encode};
use crate::error::{CryptoError, CryptoResult};
use crate::hash::access_token_hash;
use crate::jwk::ALG_EDDSA;
use crate::keypair::{KeyPair, PublicKey};
use crate::signature::Signature;

/// The `typ` value of a GNAP request-binding JWS.
pub const GNAP_BINDING_TYP: &str = "gnap-binding+jws";

/// Protected header of a request-binding JWS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingHeader {
    /// Signature algorithm.
    pub alg: String,
    /// Object type, `gnap-binding+jws`.
    pub typ: String,
    /// HTTP method of the bound request.
    pub htm: String,
    /// Full URL of the bound request.
    pub uri: String,
    /// Creation time, epoch seconds.
    pub created: i64,
    /// Hash of the presented access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ath: Option<String>,
    /// Signer key id hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl BindingHeader {
    /// Header for a request without an access token.
    #[must_use]
    pub fn new(htm: impl Into<String>, uri: impl Into<String>, created: i64) -> Self {
        Self {
            alg: ALG_EDDSA.to_owned(),
            typ: GNAP_BINDING_TYP.to_owned(),
            htm: htm.into(),
            uri: uri.into(),
            created,
            ath: None,
            kid: None,
        }
    }

    /// Bind the header to an access token value.
    #[must_use]
    pub fn with_access_token(mut self, token_value: &str) -> Self {
        self.ath = Some(access_token_hash(token_value));
        self
    }

    /// Set the key id hint.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }
}

/// Sign `payload` under `header`, producing `header.payload.signature`.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedJws`] if the header cannot be serialized.
pub fn sign_compact(header: &BindingHeader, payload: &[u8], key: &KeyPair) -> CryptoResult<String> {
    let header_json =
        serde_json::to_vec(header).map_err(|e| CryptoError::MalformedJws(e.to_string()))?;
    let signing_input = format!("{}.{}", b64url_encode(header_json), b64url_encode(payload));
    let signature = key.sign(signing_input.as_bytes());
    Ok(format!("{signing_input}.{}", signature.to_base64url()))
}

/// A compact JWS split into its three segments, not yet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactJws {
    header: String,
    payload: String,
    signature: String,
}

impl CompactJws {
    /// Split a compact serialization.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedJws`] unless the input has exactly
    /// three dot-separated segments.
    pub fn parse(compact: &str) -> CryptoResult<Self> {
        let mut parts = compact.trim().split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) if !header.is_empty() => {
                Ok(Self {
                    header: header.to_owned(),
                    payload: payload.to_owned(),
                    signature: signature.to_owned(),
                })
            },
            _ => Err(CryptoError::MalformedJws(
                "expected three dot-separated segments".to_owned(),
            )),
        }
    }

    /// Decode the payload without checking the signature.
    ///
    /// Anything read from here is attacker-controlled until [`verify`](Self::verify)
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidBase64Encoding`] on a malformed payload segment.
    pub fn unverified_payload(&self) -> CryptoResult<Vec<u8>> {
        b64url_decode(&self.payload)
    }

    /// Verify the signature with `key` and return the protected header and payload.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedJws`] for an undecodable header,
    /// [`CryptoError::UnsupportedAlgorithm`] for any `alg` other than `EdDSA`,
    /// or [`CryptoError::SignatureVerificationFailed`].
    pub fn verify(&self, key: &PublicKey) -> CryptoResult<VerifiedJws> {
        let header_bytes = b64url_decode(&self.header)?;
        let header: BindingHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| CryptoError::MalformedJws(format!("header: {e}")))?;
        if header.alg != ALG_EDDSA {
            return Err(CryptoError::UnsupportedAlgorithm(header.alg));
        }

        let signature = Signature::from_base64url(&self.signature)?;
        let signing_input = format!("{}.{}", self.header, self.payload);
        key.verify(signing_input.as_bytes(), &signature)?;

        Ok(VerifiedJws {
            header,
            payload: b64url_decode(&self.payload)?,
        })
    }
}

/// Header and payload of a JWS whose signature has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedJws {
    /// The protected header.
    pub header: BindingHeader,
    /// The raw payload bytes (empty for bodiless requests).
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> BindingHeader {
        BindingHeader::new("POST", "http://localhost:3000/gnap", 1_700_000_000)
    }

    #[test]
    fn test_sign_and_verify() {
        let key = KeyPair::generate();
        let jws = sign_compact(&header(), br#"{"a":1}"#, &key).unwrap();

        let verified = CompactJws::parse(&jws)
            .unwrap()
            .verify(&key.export_public_key())
            .unwrap();
        assert_eq!(verified.header, header());
        assert_eq!(verified.payload, br#"{"a":1}"#);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = KeyPair::generate();
        let other = KeyPair::generate();
        let jws = sign_compact(&header(), b"{}", &key).unwrap();

        let result = CompactJws::parse(&jws)
            .unwrap()
            .verify(&other.export_public_key());
        assert!(matches!(
            result,
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_substituted_header_fails() {
        let key = KeyPair::generate();
        let jws = sign_compact(&header(), b"{}", &key).unwrap();
        let forged_header = BindingHeader::new("GET", "http://localhost:3000/gnap", 1_700_000_000);
        let forged = sign_compact(&forged_header, b"{}", &KeyPair::generate()).unwrap();

        // Splice the forged header onto the original signature.
        let original: Vec<&str> = jws.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", forged_parts[0], original[1], original[2]);

        let result = CompactJws::parse(&spliced)
            .unwrap()
            .verify(&key.export_public_key());
        assert!(result.is_err());
    }

    #[test]
    fn test_alg_none_rejected() {
        let key = KeyPair::generate();
        let mut h = header();
        h.alg = "none".to_owned();
        let jws = sign_compact(&h, b"{}", &key).unwrap();

        let result = CompactJws::parse(&jws)
            .unwrap()
            .verify(&key.export_public_key());
        assert!(matches!(result, Err(CryptoError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_ath_binding() {
        let h = header().with_access_token("abc");
        assert_eq!(h.ath.as_deref(), Some(access_token_hash("abc").as_str()));
    }

    #[test]
    fn test_parse_rejects_wrong_segment_count() {
        assert!(CompactJws::parse("a.b").is_err());
        assert!(CompactJws::parse("a.b.c.d").is_err());
        assert!(CompactJws::parse(".b.c").is_err());
    }

    #[test]
    fn test_empty_payload_for_bodiless_requests() {
        let key = KeyPair::generate();
        let h = BindingHeader::new("GET", "http://localhost:3000/x", 1);
        let jws = sign_compact(&h, b"", &key).unwrap();
        assert!(jws.contains(".."));

        let verified = CompactJws::parse(&jws)
            .unwrap()
            .verify(&key.export_public_key())
            .unwrap();
        assert!(verified.payload.is_empty());
    }
}
