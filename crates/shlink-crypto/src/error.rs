//! Errors from key handling, JOSE decoding and signature checks.

use std::path::PathBuf;

use thiserror::Error;

/// Why a key, signature or JWS was rejected.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Raw key material of the wrong size.
    #[error("key must be {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required size.
        expected: usize,
        /// Size supplied.
        actual: usize,
    },

    /// Raw signature of the wrong size.
    #[error("signature must be {expected} bytes, got {actual}")]
    InvalidSignatureLength {
        /// Required size.
        expected: usize,
        /// Size supplied.
        actual: usize,
    },

    /// 32 bytes that are not an Ed25519 point.
    #[error("not an Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// A JWK for some key type or curve other than OKP/Ed25519.
    #[error("only OKP/Ed25519 keys are accepted, got {kty}/{crv}")]
    UnsupportedKey {
        /// `kty` member.
        kty: String,
        /// `crv` member.
        crv: String,
    },

    /// Well-formed signature made by a different key or over other bytes.
    #[error("signature does not verify")]
    SignatureVerificationFailed,

    /// A compact JWS that is not three decodable parts.
    #[error("malformed JWS: {0}")]
    MalformedJws(String),

    /// `alg` other than `EdDSA`.
    #[error("algorithm {0} is not accepted")]
    UnsupportedAlgorithm(String),

    /// Text outside the base64url alphabet, or padded.
    #[error("not unpadded base64url")]
    InvalidBase64Encoding,

    /// Reading or creating a key file failed.
    #[error("key file {}: {source}", path.display())]
    KeyFile {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// Key files are never read through a symlink.
    #[error("key file {} is a symlink", path.display())]
    SymlinkedKeyFile {
        /// Offending path.
        path: PathBuf,
    },
}

/// Result alias for this crate.
pub type CryptoResult<T> = Result<T, CryptoError>;
