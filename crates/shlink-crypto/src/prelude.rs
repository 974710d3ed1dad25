//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shlink_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Key types
pub use crate::{Jwk, KeyPair, KeyThumbprint, PublicKey};

// Request binding
pub use crate::{BindingHeader, CompactJws, VerifiedJws, access_token_hash, sign_compact};

// Signature and hashing
pub use crate::{ContentHash, Signature};
