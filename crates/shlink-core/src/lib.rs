//! Shlink Core - Shared data model for the link-sharing authorization core.
//!
//! This crate provides:
//! - Access request items ([`AccessRequestItem`], [`RarItem`])
//! - Policy records carried by tokens ([`PolicyRecord`])
//! - Client identity derived from a signing key ([`ClientIdentity`])
//! - Package namespace URLs ([`PackageNamespace`])
//! - Swappable time sources ([`Clock`])

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod access;
mod clock;
mod identity;
mod namespace;
mod policy;

pub use access::{AccessRequestItem, AccessType, Action, Datatype, INITIALIZE_REFERENCE, RarItem};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use identity::ClientIdentity;
pub use namespace::{NAMESPACE_SEGMENT, PackageNamespace, owner_prefix};
pub use policy::{PolicyPermission, PolicyRecord, Who};
