//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shlink_gateway::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuthError, GatewayError, GatewayResult};

// Server
pub use crate::{AuthorizationServer, ResourceProvider, ServerSettings};

// Requests
pub use crate::{InboundRequest, RequestAuthenticator, RequestSigner, Response};

// Protocol
pub use crate::{GrantRequest, GrantResponse, PolicyRequest, PolicyResponse};
