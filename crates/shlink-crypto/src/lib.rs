//! Shlink Crypto - Cryptographic primitives for proof-of-possession requests.
//!
//! This crate provides:
//! - Ed25519 key pairs with secure memory handling
//! - JSON Web Keys and RFC 7638 thumbprints (the client key identifier)
//! - Compact JWS with a GNAP request-binding header
//! - SHA-256 hashing for token binding (`ath`)
//!
//! # Example
//!
//! ```
//! use shlink_crypto::{BindingHeader, CompactJws, KeyPair, sign_compact};
//!
//! let keypair = KeyPair::generate();
//! let header = BindingHeader::new("POST", "https://example.org/gnap", 1_700_000_000);
//! let jws = sign_compact(&header, b"{}", &keypair).unwrap();
//!
//! let verified = CompactJws::parse(&jws)
//!     .unwrap()
//!     .verify(&keypair.export_public_key())
//!     .unwrap();
//! assert_eq!(verified.header.htm, "POST");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod encoding;
mod error;
mod hash;
mod jwk;
mod jws;
mod keypair;
mod signature;

pub use encoding::{b64url_decode, b64url_encode};
pub use error::{CryptoError, CryptoResult};
pub use hash::{ContentHash, access_token_hash, constant_time_eq};
pub use jwk::{ALG_EDDSA, Jwk, KeyThumbprint};
pub use jws::{BindingHeader, CompactJws, GNAP_BINDING_TYP, VerifiedJws, sign_compact};
pub use keypair::{KeyPair, PublicKey};
pub use signature::Signature;
