//! Client signing keys.
//!
//! A GNAP client is identified by nothing but its Ed25519 verifying key. The
//! JWK thumbprint of that key names the client's namespace on the server, so
//! losing the secret means losing control of everything stored under it.

use std::io::{ErrorKind, Write};
use std::path::Path;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::encoding::{b64url_decode, b64url_encode};
use crate::error::{CryptoError, CryptoResult};
use crate::jwk::{Jwk, KeyThumbprint};
use crate::signature::Signature;

const SECRET_LEN: usize = 32;

/// A client's Ed25519 signing key. The secret half is wiped on drop.
#[derive(ZeroizeOnDrop)]
pub struct KeyPair {
    signing_key: SigningKey,
    #[zeroize(skip)]
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Fresh key from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild a key from its 32 secret bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] for any other length.
    pub fn from_secret_key(bytes: &[u8]) -> CryptoResult<Self> {
        let secret: Zeroizing<[u8; SECRET_LEN]> =
            Zeroizing::new(bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: SECRET_LEN,
                actual: bytes.len(),
            })?);
        Ok(Self::from_signing_key(SigningKey::from_bytes(&secret)))
    }

    /// Raw verifying key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    /// Thumbprint of [`KeyPair::public_jwk`], the client's namespace id.
    #[must_use]
    pub fn thumbprint(&self) -> KeyThumbprint {
        self.export_public_key().thumbprint()
    }

    /// Sign `message` with the secret half.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from(self.signing_key.sign(message))
    }

    /// Check a signature against this key's public half.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] on mismatch.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        self.export_public_key().verify(message, signature)
    }

    /// Copy of the verifying key.
    #[must_use]
    pub fn export_public_key(&self) -> PublicKey {
        PublicKey::from_bytes(*self.public_key_bytes())
    }

    /// The `client.key.jwk` a grant request carries.
    #[must_use]
    pub fn public_jwk(&self) -> Jwk {
        Jwk::from_public_key(&self.export_public_key())
    }

    /// Secret bytes, wiped when the returned buffer drops.
    #[must_use]
    pub fn secret_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Read the key at `path`, creating it first if the file does not exist.
    ///
    /// Missing parent directories are created. A new file is written with
    /// `create_new` (mode 0600 on Unix), so two processes racing on the same
    /// path end up sharing one key. Existing files are only read when they
    /// are not symlinks.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyFile`] on I/O failure,
    /// [`CryptoError::SymlinkedKeyFile`] for a symlink, or
    /// [`CryptoError::InvalidKeyLength`] when the file is not 32 bytes.
    pub fn load_or_generate(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();
        let io_err = |source| CryptoError::KeyFile {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        match create_key_file(path) {
            Ok(mut file) => {
                let key = Self::generate();
                file.write_all(key.secret_key_bytes().as_slice())
                    .map_err(io_err)?;
                return Ok(key);
            },
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {},
            Err(e) => return Err(io_err(e)),
        }

        if std::fs::symlink_metadata(path)
            .map_err(io_err)?
            .file_type()
            .is_symlink()
        {
            return Err(CryptoError::SymlinkedKeyFile {
                path: path.to_path_buf(),
            });
        }
        let bytes = Zeroizing::new(std::fs::read(path).map_err(io_err)?);
        Self::from_secret_key(&bytes)
    }
}

#[cfg(unix)]
fn create_key_file(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_key_file(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("thumbprint", &self.thumbprint())
            .finish_non_exhaustive()
    }
}

/// A verifying key. Serializes as its unpadded base64url bytes, the same
/// text as a JWK `x` member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Wrap raw bytes without checking them.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Accept `slice` only if it is 32 bytes encoding a curve point.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] or
    /// [`CryptoError::InvalidPublicKey`].
    pub fn try_from_slice(slice: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: slice.len(),
        })?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// RFC 7638 thumbprint of this key's JWK.
    #[must_use]
    pub fn thumbprint(&self) -> KeyThumbprint {
        KeyThumbprint::of(self)
    }

    /// The JWK `x` encoding.
    #[must_use]
    pub fn to_base64url(&self) -> String {
        b64url_encode(self.0)
    }

    /// Parse the JWK `x` encoding.
    ///
    /// # Errors
    ///
    /// Fails on bad base64url, or as [`PublicKey::try_from_slice`] does.
    pub fn from_base64url(s: &str) -> CryptoResult<Self> {
        Self::try_from_slice(&b64url_decode(s)?)
    }

    /// Check an Ed25519 signature.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] unless `signature`
    /// was made over `message` by this key's secret.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        signature.verify(message, &self.0)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = CryptoError;

    fn try_from(value: String) -> CryptoResult<Self> {
        Self::from_base64url(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_base64url()
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_base64url()).finish()
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_distinct_clients() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        assert_ne!(alice.thumbprint(), bob.thumbprint());
    }

    #[test]
    fn test_secret_restores_same_identity() {
        let original = KeyPair::generate();
        let restored = KeyPair::from_secret_key(original.secret_key_bytes().as_slice()).unwrap();
        assert_eq!(restored.thumbprint(), original.thumbprint());

        let sig = restored.sign(b"grant");
        original.verify(b"grant", &sig).unwrap();
        assert!(matches!(
            original.verify(b"grants", &sig),
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_lengths_checked() {
        assert!(matches!(
            KeyPair::from_secret_key(&[7u8; 31]),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 31 })
        ));
        assert!(matches!(
            PublicKey::try_from_slice(&[0u8; 33]),
            Err(CryptoError::InvalidKeyLength { actual: 33, .. })
        ));
    }

    #[test]
    fn test_public_key_is_json_string() {
        let pk = KeyPair::generate().export_public_key();
        let json = serde_json::to_value(pk).unwrap();
        assert_eq!(json, serde_json::Value::String(pk.to_base64url()));
        assert_eq!(serde_json::from_value::<PublicKey>(json).unwrap(), pk);

        assert!(serde_json::from_str::<PublicKey>("\"AAAA\"").is_err());
    }

    #[test]
    fn test_key_file_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("client.key");

        let created = KeyPair::load_or_generate(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap().len(), 32);
        let loaded = KeyPair::load_or_generate(&path).unwrap();
        assert_eq!(created.thumbprint(), loaded.thumbprint());
    }

    #[test]
    fn test_truncated_key_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.key");
        std::fs::write(&path, [1u8; 16]).unwrap();

        assert!(matches!(
            KeyPair::load_or_generate(&path),
            Err(CryptoError::InvalidKeyLength { actual: 16, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.key");
        KeyPair::load_or_generate(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_key_file_refused() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.key");
        let link = dir.path().join("client.key");
        KeyPair::load_or_generate(&target).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = KeyPair::load_or_generate(&link).unwrap_err();
        assert!(matches!(err, CryptoError::SymlinkedKeyFile { .. }));
        assert!(err.to_string().contains("symlink"));
    }
}
