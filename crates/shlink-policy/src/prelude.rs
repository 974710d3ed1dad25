//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shlink_policy::prelude::*;` to import all essential types.

// Errors
pub use crate::{ClaimError, PolicyError, PolicyResult};

// Links
pub use crate::{LinkPolicy, LinkRegistry, LinkTerms};

// Engine
pub use crate::{EngineOutcome, PolicyContext, PolicyEngine};
