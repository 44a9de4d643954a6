//! Per-call outcomes and the aggregate response document.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::upstream::Upstream;

/// Literal substituted for any value that could not be obtained.
pub const UNAVAILABLE: &str = "N/A";

/// The settled result of one upstream call.
pub type CallOutcome = Result<UpstreamBody, Failure>;

/// Parsed JSON object returned by an upstream with status 200.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpstreamBody(Map<String, Value>);

impl UpstreamBody {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// String field by name, or `"N/A"` when absent, null or not a string.
    pub fn text_field(&self, key: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(UNAVAILABLE)
            .to_string()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Why an upstream call did not produce a usable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Upstream answered with something other than 200.
    UpstreamStatus { status: u16 },
    Timeout,
    /// Connection-level failure.
    Transport,
    /// The breaker refused the call without invoking the upstream.
    CircuitOpen,
    /// 200 but the body is not a JSON object.
    InvalidBody,
    /// The call's task panicked or was aborted.
    Internal,
}

impl FailureKind {
    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UpstreamStatus { .. } => "upstream_status",
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport",
            FailureKind::CircuitOpen => "circuit_open",
            FailureKind::InvalidBody => "invalid_body",
            FailureKind::Internal => "internal",
        }
    }
}

/// A classified upstream failure, scoped to one request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub upstream: Upstream,
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn upstream_status(upstream: Upstream, status: u16) -> Self {
        Self {
            upstream,
            kind: FailureKind::UpstreamStatus { status },
            message: format!("Failed to fetch {} data", upstream.subject()),
        }
    }

    pub fn timeout(upstream: Upstream) -> Self {
        Self {
            upstream,
            kind: FailureKind::Timeout,
            message: format!("Timed out fetching {} data", upstream.subject()),
        }
    }

    pub fn transport(upstream: Upstream, detail: impl AsRef<str>) -> Self {
        Self {
            upstream,
            kind: FailureKind::Transport,
            message: format!("Failed to reach {} service: {}", upstream.subject(), detail.as_ref()),
        }
    }

    pub fn circuit_open(upstream: Upstream) -> Self {
        Self {
            upstream,
            kind: FailureKind::CircuitOpen,
            message: format!("Circuit open for {} service", upstream.subject()),
        }
    }

    pub fn invalid_body(upstream: Upstream, detail: impl AsRef<str>) -> Self {
        Self {
            upstream,
            kind: FailureKind::InvalidBody,
            message: format!("Invalid {} data: {}", upstream.subject(), detail.as_ref()),
        }
    }

    pub fn internal(upstream: Upstream, detail: impl AsRef<str>) -> Self {
        Self {
            upstream,
            kind: FailureKind::Internal,
            message: format!("Internal server error: {}", detail.as_ref()),
        }
    }

    /// HTTP status reported to the client when this failure is surfaced.
    ///
    /// An upstream's own 4xx/5xx is preserved; anything else maps onto the
    /// gateway error range.
    pub fn status_code(&self) -> u16 {
        match self.kind {
            FailureKind::UpstreamStatus { status } if (400..=599).contains(&status) => status,
            FailureKind::UpstreamStatus { .. } => 502,
            FailureKind::Timeout => 504,
            FailureKind::Transport => 502,
            FailureKind::CircuitOpen => 503,
            FailureKind::InvalidBody => 502,
            FailureKind::Internal => 500,
        }
    }

    /// Machine-readable `errorCode`.
    pub fn error_code(&self) -> String {
        let suffix = match self.kind {
            FailureKind::UpstreamStatus { .. } => "ERROR",
            FailureKind::Timeout => "TIMEOUT",
            FailureKind::Transport => "UNREACHABLE",
            FailureKind::CircuitOpen => "CIRCUIT_OPEN",
            FailureKind::InvalidBody => "INVALID_BODY",
            FailureKind::Internal => return "INTERNAL_ERROR".to_string(),
        };
        format!("{}_{}", self.upstream.error_prefix(), suffix)
    }
}

/// Response document for `GET /aggregate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub post_title: String,
    pub author_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
