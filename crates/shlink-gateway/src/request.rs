//! Framework-neutral request and response values.
//!
//! The gateway does not bind to an HTTP framework. A host adapts its own
//! request type into an [`InboundRequest`] (full URL, headers, raw body) and
//! writes the returned [`Response`] back out.

use std::collections::BTreeMap;

use serde_json::json;

use crate::error::GatewayError;

/// Methods whose signed envelope travels in the `Detached-JWS` header.
pub const METHODS_WITHOUT_BODY: [&str; 3] = ["GET", "HEAD", "OPTIONS"];

/// Header carrying the envelope for bodiless methods.
pub const DETACHED_JWS_HEADER: &str = "detached-jws";

/// Header carrying `GNAP <token>`.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Header naming the body media type.
pub const CONTENT_TYPE_HEADER: &str = "content-type";

/// Media type of a JWS request body.
pub const JOSE_CONTENT_TYPE: &str = "application/jose";

/// Authorization scheme for access tokens.
pub const GNAP_AUTH_SCHEME: &str = "GNAP";

/// Whether `method` carries its envelope in the body.
#[must_use]
pub fn method_has_body(method: &str) -> bool {
    !METHODS_WITHOUT_BODY
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

/// Header map with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Look a header up by name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Iterate `(lowercase name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An inbound request as the gateway sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Fully qualified request URL, as the client signed it.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Raw body; `None` for bodiless methods.
    pub body: Option<Vec<u8>>,
}

impl InboundRequest {
    /// Request without headers or body.
    #[must_use]
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The token from an `Authorization: GNAP <token>` header.
    ///
    /// Other schemes are ignored.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        let value = self.headers.get(AUTHORIZATION_HEADER)?.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case(GNAP_AUTH_SCHEME) && !token.is_empty()).then_some(token)
    }

    /// The signed envelope: the `Detached-JWS` header for bodiless methods,
    /// the body otherwise.
    ///
    /// Returns `Ok(None)` when it is absent or empty, and `Err` with a reason
    /// when the body is not UTF-8.
    pub(crate) fn envelope(&self) -> Result<Option<&str>, String> {
        let raw = if method_has_body(&self.method) {
            match &self.body {
                Some(bytes) => Some(
                    std::str::from_utf8(bytes)
                        .map_err(|e| format!("body is not UTF-8: {e}"))?,
                ),
                None => None,
            }
        } else {
            self.headers.get(DETACHED_JWS_HEADER)
        };
        Ok(raw.map(str::trim).filter(|s| !s.is_empty()))
    }
}

/// Status code and JSON body produced by [`handle`](crate::AuthorizationServer::handle).
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: serde_json::Value,
}

impl Response {
    /// A `200` response.
    #[must_use]
    pub fn ok(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    /// An error response: `{"error": code, "message": text}`.
    #[must_use]
    pub fn error(err: &GatewayError) -> Self {
        Self {
            status: err.status(),
            body: json!({
                "error": err.code(),
                "message": err.to_string(),
            }),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
