//! Request correlation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Identity and timing of one inbound request, attached to every log line
/// emitted while it is handled.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    /// Random per-request id.
    pub request_id: Uuid,
    /// Arrival time.
    pub started_at: DateTime<Utc>,
    /// Component that accepted the request.
    pub source: &'static str,
    /// `grant`, `share` or `fetch`, once routed.
    pub operation: Option<&'static str>,
    /// HTTP method.
    pub method: String,
    /// Path below the public URL.
    pub path: String,
}

impl RequestContext {
    /// Start timing a request.
    #[must_use]
    pub fn new(source: &'static str, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
            source,
            operation: None,
            method: method.into(),
            path: path.into(),
        }
    }

    /// Name the operation the request was routed to.
    #[must_use]
    pub fn routed_to(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Milliseconds since [`RequestContext::new`].
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Leading hex digits of the request id; enough to grep logs by.
    #[must_use]
    pub fn short_id(&self) -> String {
        let mut id = self.request_id.simple().to_string();
        id.truncate(8);
        id
    }

    /// An `info` span with the request's fields. Instrument futures with it
    /// rather than entering it across awaits.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            id = %self.short_id(),
            source = self.source,
            op = self.operation,
            method = %self.method,
            path = %self.path,
        )
    }

    /// Log the final status and latency. Call inside [`Self::span`].
    pub fn finish(&self, status: u16) {
        tracing::debug!(status, elapsed_ms = self.elapsed_ms(), "request finished");
    }
}
