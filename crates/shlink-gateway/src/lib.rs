//! Shlink Gateway - Signed-request authentication and the link-sharing operations.
//!
//! This crate provides:
//! - [`RequestAuthenticator`]: proof-of-possession checks over a signed request
//! - [`RequestSigner`]: the matching client-side signer
//! - [`AuthorizationServer`]: `POST /gnap`, `PUT .../policy` and
//!   `GET .../data/{file}` over framework-neutral [`InboundRequest`]s
//! - [`ResourceProvider`]: the collaborator that serves authorized reads
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shlink_core::{AccessRequestItem, INITIALIZE_REFERENCE};
//! use shlink_crypto::KeyPair;
//! use shlink_gateway::{
//!     AuthorizationServer, GrantRequest, MemoryResources, RequestSigner, ServerSettings,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let server = AuthorizationServer::new(
//!     ServerSettings::new("https://links.example"),
//!     Arc::new(MemoryResources::new()),
//! );
//!
//! let alice = RequestSigner::new(KeyPair::generate());
//! let grant = GrantRequest::new(
//!     vec![AccessRequestItem::Reference(INITIALIZE_REFERENCE.to_owned())],
//!     alice.descriptor(),
//! );
//! let request = alice
//!     .sign("POST", "https://links.example/gnap", Some(&grant), None)
//!     .unwrap();
//!
//! let response = server.request_grant(&request).await.unwrap();
//! assert_eq!(response.access_token.access.len(), 2);
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod auth;
pub mod client;
pub mod config_bridge;
pub mod error;
pub mod protocol;
pub mod request;
pub mod resources;
pub mod routes;
pub mod server;

pub use auth::{AuthenticatedRequest, DEFAULT_FRESHNESS_WINDOW_SECS, RequestAuthenticator};
pub use client::RequestSigner;
pub use error::{AuthError, AuthResult, GatewayError, GatewayResult};
pub use protocol::{
    AccessTokenRequest, ClaimEndpoint, ClientDescriptor, ClientKey, GrantRequest, GrantResponse,
    IssuedToken, PolicyRequest, PolicyResponse, ShclinkExtension,
};
pub use request::{Headers, InboundRequest, Response};
pub use resources::{FhirBundleResources, MemoryResources, ResourceProvider};
pub use routes::Route;
pub use server::{AuthorizationServer, DEFAULT_SWEEP_INTERVAL, ServerSettings};
