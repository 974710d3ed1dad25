//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shlink_capabilities::prelude::*;` to import all essential types.

pub use crate::{AccessToken, AccessTokenStore, CapabilityError, CapabilityResult};
pub use crate::{Introspection, ResourceAccessGate};
