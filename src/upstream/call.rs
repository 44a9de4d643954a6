//! Upstream identities and the per-call fetch/classify step.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::aggregate::outcome::{CallOutcome, Failure, UpstreamBody};
use crate::upstream::client::{TransportError, UpstreamClient, UpstreamResponse};

/// The two upstream APIs the gateway joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    Posts,
    Users,
}

impl Upstream {
    /// Identity used in logs, metrics and breaker names.
    pub fn name(self) -> &'static str {
        match self {
            Upstream::Posts => "posts",
            Upstream::Users => "users",
        }
    }

    /// Singular noun used in client-facing messages.
    pub fn subject(self) -> &'static str {
        match self {
            Upstream::Posts => "post",
            Upstream::Users => "user",
        }
    }

    /// Prefix of the `errorCode` values reported for this upstream.
    pub fn error_prefix(self) -> &'static str {
        match self {
            Upstream::Posts => "POST_API",
            Upstream::Users => "USER_API",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One configured upstream request, built once at startup.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub upstream: Upstream,
    pub url: String,
    pub timeout: Duration,
}

impl UpstreamCall {
    pub fn new(upstream: Upstream, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            upstream,
            url: url.into(),
            timeout,
        }
    }

    /// Perform the GET and classify the reply.
    pub async fn fetch(&self, client: &dyn UpstreamClient) -> CallOutcome {
        let outcome = match client.get(&self.url, self.timeout).await {
            Ok(response) => classify_response(self.upstream, response),
            Err(TransportError::Timeout) => Err(Failure::timeout(self.upstream)),
            Err(e) => Err(Failure::transport(self.upstream, e.to_string())),
        };

        if let Err(failure) = &outcome {
            tracing::warn!(
                upstream = %self.upstream,
                url = %self.url,
                kind = failure.kind.as_str(),
                error = %failure,
                "Error fetching {} data",
                self.upstream.subject()
            );
        }

        outcome
    }
}

/// Only 200 with a JSON object body is a success.
pub fn classify_response(upstream: Upstream, response: UpstreamResponse) -> CallOutcome {
    if response.status != 200 {
        return Err(Failure::upstream_status(upstream, response.status));
    }

    serde_json::from_slice::<Map<String, Value>>(&response.body)
        .map(UpstreamBody::new)
        .map_err(|e| Failure::invalid_body(upstream, e.to_string()))
}
