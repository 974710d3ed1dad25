//! Test fixtures for common values and request bodies.

use shlink_gateway::{PolicyRequest, ServerSettings};

/// Public URL every harness server runs under.
pub const TEST_PUBLIC_URL: &str = "https://links.test";

/// Unix time the harness clock starts at.
pub const TEST_EPOCH: i64 = 1_700_000_000;

/// Default server settings rooted at [`TEST_PUBLIC_URL`].
#[must_use]
pub fn test_settings() -> ServerSettings {
    ServerSettings::new(TEST_PUBLIC_URL)
}

/// A policy body sharing `locations` with room for `claim_limit` claims.
#[must_use]
pub fn share_body<I, S>(locations: I, claim_limit: u32) -> PolicyRequest
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PolicyRequest {
        pin: None,
        claim_limit,
        locations: locations
            .into_iter()
            .map(|l| l.as_ref().to_owned())
            .collect(),
    }
}

/// Like [`share_body`], additionally protected by `pin`.
#[must_use]
pub fn pin_share_body<I, S>(locations: I, claim_limit: u32, pin: &str) -> PolicyRequest
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PolicyRequest {
        pin: Some(pin.to_owned()),
        ..share_body(locations, claim_limit)
    }
}

/// Route `tracing` output to the test writer, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
