//! Shlink Capabilities - Access tokens and the resource access gate.
//!
//! This crate provides:
//! - Opaque, client-bound access tokens carrying granted access items
//! - Token storage with lazy expiry and cascading revocation by package
//! - The resource access gate (exact-location coverage checks)
//!
//! # Security Model
//!
//! Every access token is:
//! - 32 bytes from the OS random source
//! - Bound to the key of the client it was issued to
//! - Time-bounded (300 seconds unless configured otherwise)
//! - Tagged with the policies that enabled it, so replacing a link policy
//!   can revoke everything claimed under it
//!
//! # Example
//!
//! ```
//! use shlink_capabilities::{AccessTokenStore, ResourceAccessGate};
//! use shlink_core::{AccessType, ClientIdentity, PolicyRecord, RarItem};
//! use shlink_crypto::KeyPair;
//!
//! let store = AccessTokenStore::in_memory();
//! let client = ClientIdentity::from_public_key(KeyPair::generate().export_public_key());
//! let file = "https://example.org/shclinks/k/p/data/x.json";
//!
//! let token = store
//!     .save(vec![RarItem::read([file])], vec![PolicyRecord::claim("p")], client)
//!     .unwrap();
//!
//! let introspection = store.introspect(&token.value).unwrap();
//! assert!(ResourceAccessGate::check(&introspection, AccessType::Read, file).is_ok());
//!
//! store.revoke_by_package("p").unwrap();
//! let introspection = store.introspect(&token.value).unwrap();
//! assert!(ResourceAccessGate::check(&introspection, AccessType::Read, file).is_err());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod store;
mod token;
mod validator;

pub use error::{CapabilityError, CapabilityResult};
pub use store::{AccessTokenStore, DEFAULT_TOKEN_TTL_SECS, Introspection};
pub use token::{AccessToken, TOKEN_VALUE_BYTES, generate_token_value, token_fingerprint};
pub use validator::ResourceAccessGate;
