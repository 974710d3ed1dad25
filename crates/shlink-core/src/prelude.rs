//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shlink_core::prelude::*;` to import all essential types.

// Access items
pub use crate::{AccessRequestItem, AccessType, Action, RarItem};

// Policy bookkeeping
pub use crate::{PolicyPermission, PolicyRecord, Who};

// Identity and namespaces
pub use crate::{ClientIdentity, PackageNamespace};

// Time
pub use crate::{Clock, ManualClock, SharedClock, SystemClock};
