//! Configuration struct definitions.
//!
//! Every section implements [`Default`] with the same values as the
//! embedded `defaults.toml`, so a partially specified file deserializes to a
//! complete configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener and public URL.
    pub server: ServerSection,
    /// Access token issuance.
    pub tokens: TokensSection,
    /// Signed request checks.
    pub requests: RequestsSection,
    /// Link sharing limits.
    pub links: LinksSection,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

impl Config {
    /// The public base URL: `server.public_url` if set, otherwise
    /// `http://localhost:{server.port}`.
    #[must_use]
    pub fn public_url(&self) -> String {
        self.server
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
    }
}

// ---------------------------------------------------------------------------
// ServerSection
// ---------------------------------------------------------------------------

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Base URL clients sign requests against, without a trailing slash.
    /// Namespace locations are rooted here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// Listening port.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            public_url: None,
            port: 3000,
        }
    }
}

// ---------------------------------------------------------------------------
// TokensSection
// ---------------------------------------------------------------------------

/// Access token configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensSection {
    /// Token lifetime in seconds.
    pub ttl_secs: u64,
    /// How often expired tokens are deleted, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for TokensSection {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// RequestsSection
// ---------------------------------------------------------------------------

/// Signed request configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestsSection {
    /// Largest accepted `|now - created|`, in seconds.
    pub freshness_window_secs: u64,
}

impl Default for RequestsSection {
    fn default() -> Self {
        Self {
            freshness_window_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// LinksSection
// ---------------------------------------------------------------------------

/// Link sharing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksSection {
    /// Consecutive PIN failures that deactivate a link.
    pub pin_lockout_threshold: u32,
    /// Optional cap on the claim limit a share request may set. Unset means
    /// any limit of at least one is accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_claim_limit: Option<u32>,
}

impl Default for LinksSection {
    fn default() -> Self {
        Self {
            pin_lockout_threshold: 5,
            max_claim_limit: None,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["shlink_gateway=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
