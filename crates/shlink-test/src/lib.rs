//! Shlink Test - Shared test utilities for the link-sharing core.
//!
//! This crate provides an in-process [`TestHarness`] (an authorization
//! server on a manual clock with in-memory resources), signing
//! [`TestClient`]s, and fixtures for the common request bodies.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! shlink-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_share_and_claim() {
//!     let harness = TestHarness::new();
//!     let (alice, bob) = (harness.client("alice"), harness.client("bob"));
//!
//!     let package = harness.initialize(&alice).await.unwrap();
//!     let file = package.file_url("x.json");
//!     let link = harness.share(&alice, &package, &share_body([&file], 1)).await.unwrap();
//!
//!     let grant = harness.claim(&bob, &link.gnap.access, None).await.unwrap();
//!     harness.fetch(&bob, &file, &grant.access_token.value).await.unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod client;
pub mod fixtures;
pub mod harness;

pub use client::TestClient;
pub use fixtures::*;
pub use harness::{OwnedPackage, TestHarness};
pub use shlink_core::ManualClock;
