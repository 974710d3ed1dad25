//! Shlink Telemetry - Logging and request tracing.
//!
//! This crate provides:
//! - [`setup_logging`]: a `tracing-subscriber` setup driven by [`LogConfig`]
//! - [`RequestContext`]: per-request spans with ids and timing
//!
//! # Example
//!
//! ```rust,no_run
//! use shlink_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), shlink_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("shlink_policy=debug");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("gateway", "POST", "/gnap").routed_to("grant");
//! ctx.span().in_scope(|| {
//!     tracing::info!("handling grant request");
//!     ctx.finish(200);
//! });
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
