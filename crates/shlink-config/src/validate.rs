//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server(config)?;
    validate_tokens(config)?;
    validate_requests(config)?;
    validate_links(config)?;
    validate_logging(config)?;
    Ok(())
}

/// Longest accepted token lifetime (one day).
const MAX_TOKEN_TTL_SECS: u64 = 86_400;

/// Widest accepted freshness window (one hour).
const MAX_FRESHNESS_WINDOW_SECS: u64 = 3_600;

fn invalid(field: &str, message: impl Into<String>) -> ConfigResult<()> {
    Err(ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    })
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    if config.server.port == 0 {
        return invalid("server.port", "port must be non-zero");
    }

    let Some(url) = config.server.public_url.as_deref() else {
        return Ok(());
    };
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return invalid(
            "server.public_url",
            format!("'{url}' must start with http:// or https://"),
        );
    };
    if rest.is_empty() || rest.starts_with('/') {
        return invalid("server.public_url", format!("'{url}' has no host"));
    }
    if url.ends_with('/') {
        return invalid(
            "server.public_url",
            format!("'{url}' must not end with a slash"),
        );
    }
    if url.contains(['?', '#']) || url.chars().any(char::is_whitespace) {
        return invalid(
            "server.public_url",
            format!("'{url}' must be a plain base URL"),
        );
    }
    Ok(())
}

fn validate_tokens(config: &Config) -> ConfigResult<()> {
    let ttl = config.tokens.ttl_secs;
    if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
        return invalid(
            "tokens.ttl_secs",
            format!("ttl_secs must be between 1 and {MAX_TOKEN_TTL_SECS}, got {ttl}"),
        );
    }
    let sweep = config.tokens.sweep_interval_secs;
    if sweep == 0 || sweep > MAX_TOKEN_TTL_SECS {
        return invalid(
            "tokens.sweep_interval_secs",
            format!("sweep_interval_secs must be between 1 and {MAX_TOKEN_TTL_SECS}, got {sweep}"),
        );
    }
    Ok(())
}

fn validate_requests(config: &Config) -> ConfigResult<()> {
    let window = config.requests.freshness_window_secs;
    if window == 0 || window > MAX_FRESHNESS_WINDOW_SECS {
        return invalid(
            "requests.freshness_window_secs",
            format!(
                "freshness_window_secs must be between 1 and {MAX_FRESHNESS_WINDOW_SECS}, got {window}"
            ),
        );
    }
    Ok(())
}

fn validate_links(config: &Config) -> ConfigResult<()> {
    if config.links.pin_lockout_threshold == 0 {
        return invalid("links.pin_lockout_threshold", "threshold must be at least 1");
    }
    if config.links.max_claim_limit == Some(0) {
        return invalid("links.max_claim_limit", "max_claim_limit must be at least 1");
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return invalid(
            "logging.level",
            format!(
                "unsupported level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        );
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_public_url_rules() {
        for bad in [
            "ftp://x",
            "localhost:3000",
            "http://",
            "http:///path",
            "http://x/",
            "http://x?y=1",
        ] {
            let mut config = Config::default();
            config.server.public_url = Some(bad.to_owned());
            assert_eq!(field_of(validate(&config)), "server.public_url", "{bad}");
        }

        let mut config = Config::default();
        config.server.public_url = Some("https://links.example.org/base".to_owned());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_durations_rejected() {
        let mut config = Config::default();
        config.tokens.ttl_secs = 0;
        assert_eq!(field_of(validate(&config)), "tokens.ttl_secs");

        let mut config = Config::default();
        config.tokens.sweep_interval_secs = 0;
        assert_eq!(field_of(validate(&config)), "tokens.sweep_interval_secs");

        let mut config = Config::default();
        config.requests.freshness_window_secs = 0;
        assert_eq!(field_of(validate(&config)), "requests.freshness_window_secs");
    }

    #[test]
    fn test_link_limits() {
        let mut config = Config::default();
        config.links.pin_lockout_threshold = 0;
        assert_eq!(field_of(validate(&config)), "links.pin_lockout_threshold");

        let mut config = Config::default();
        config.links.max_claim_limit = Some(0);
        assert_eq!(field_of(validate(&config)), "links.max_claim_limit");
    }

    #[test]
    fn test_logging_values() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.format");

        let mut config = Config::default();
        config.logging.level = "loud".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.level");
    }
}
