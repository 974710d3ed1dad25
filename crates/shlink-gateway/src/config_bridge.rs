//! Bridge from `shlink_config::Config` to [`ServerSettings`].

use std::time::Duration;

use shlink_config::Config;

use crate::error::{GatewayError, GatewayResult};
use crate::server::ServerSettings;

/// Convert a loaded [`Config`] into server settings.
///
/// # Errors
///
/// Returns [`GatewayError::Config`] if a duration does not fit the clock's
/// signed seconds.
pub fn from_config(cfg: &Config) -> GatewayResult<ServerSettings> {
    Ok(ServerSettings {
        public_url: cfg.public_url(),
        token_ttl_secs: secs("tokens.ttl_secs", cfg.tokens.ttl_secs)?,
        freshness_window_secs: secs(
            "requests.freshness_window_secs",
            cfg.requests.freshness_window_secs,
        )?,
        pin_lockout_threshold: cfg.links.pin_lockout_threshold,
        max_claim_limit: cfg.links.max_claim_limit,
        sweep_interval: Duration::from_secs(cfg.tokens.sweep_interval_secs),
    })
}

fn secs(field: &str, value: u64) -> GatewayResult<i64> {
    i64::try_from(value).map_err(|_| GatewayError::Config(format!("{field} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let settings = from_config(&Config::default()).unwrap();
        assert_eq!(settings, ServerSettings::default());
    }

    #[test]
    fn test_from_custom_config() {
        let mut cfg = Config::default();
        cfg.server.public_url = Some("https://links.example".to_owned());
        cfg.tokens.ttl_secs = 60;
        cfg.links.pin_lockout_threshold = 3;

        let settings = from_config(&cfg).unwrap();
        assert_eq!(settings.public_url, "https://links.example");
        assert_eq!(settings.token_ttl_secs, 60);
        assert_eq!(settings.pin_lockout_threshold, 3);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.tokens.ttl_secs = u64::MAX;
        assert!(matches!(from_config(&cfg), Err(GatewayError::Config(_))));
    }
}
