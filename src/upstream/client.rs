//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Issue a GET to an absolute URL with a per-request deadline
//! - Return status + body, or a transport-level error
//!
//! # Design Decisions
//! - No retries and no interpretation of status codes here
//! - One pooled `reqwest::Client` shared by both upstream paths
//! - Trait object seam so the orchestrator can be driven by in-memory clients in tests

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

use crate::config::{TimeoutConfig, UpstreamsConfig};

/// Connection-level failure reaching an upstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Raw upstream reply, before any classification.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Capability to perform a GET against an upstream API.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<UpstreamResponse, TransportError>;
}

/// `reqwest`-backed upstream client.
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    client: reqwest::Client,
}

impl HttpUpstreamClient {
    /// Build a pooled keep-alive client from the upstream and timeout settings.
    pub fn new(upstreams: &UpstreamsConfig, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(timeouts.connect_ms))
            .pool_idle_timeout(Duration::from_millis(timeouts.idle_ms))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("aggregate-gateway/", env!("CARGO_PKG_VERSION")));
        if !upstreams.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<UpstreamResponse, TransportError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(url = %url, status, bytes = body.len(), "Upstream responded");

        Ok(UpstreamResponse { status, body })
    }
}
