//! Shlink Policy - Link sharing terms and grant decisions.
//!
//! This crate provides:
//! - [`LinkPolicy`] / [`LinkTerms`]: how a package may be claimed (PIN,
//!   claim limit, granted read rights)
//! - [`LinkRegistry`]: owner of every link policy, with atomic claims and
//!   PIN lockout
//! - [`PolicyEngine`]: the ordered evaluator chain (`initialize`, `manage`,
//!   `claim`) that turns a requested access list into a grant
//!
//! # Example
//!
//! ```
//! use shlink_core::{AccessRequestItem, ClientIdentity, RarItem};
//! use shlink_crypto::KeyPair;
//! use shlink_policy::{LinkRegistry, LinkTerms, PolicyContext, PolicyEngine};
//!
//! let registry = LinkRegistry::in_memory();
//! registry
//!     .put("pkg", LinkTerms {
//!         pin: None,
//!         claim_limit: 1,
//!         granted_access: vec![RarItem::read(["https://example.org/shclinks/k/pkg/data/x.json"])],
//!     })
//!     .unwrap();
//!
//! let bob = ClientIdentity::from_public_key(KeyPair::generate().export_public_key());
//! let ctx = PolicyContext {
//!     client: &bob,
//!     pin: None,
//!     public_url: "https://example.org",
//!     registry: &registry,
//! };
//!
//! let outcome = PolicyEngine::new()
//!     .evaluate(&[AccessRequestItem::Reference("pkg".into())], &ctx)
//!     .unwrap();
//! assert_eq!(outcome.granted_access.len(), 1);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod engine;
pub mod error;
pub mod links;

pub use engine::{
    EVALUATORS, EngineOutcome, Evaluation, Evaluator, Grant, PolicyContext, PolicyEngine,
    claimed_link_ids,
};
pub use error::{ClaimError, PolicyError, PolicyResult};
pub use links::{
    Claim, DEFAULT_PIN_LOCKOUT_THRESHOLD, LinkPolicy, LinkRegistry,
    LinkTerms,
};
