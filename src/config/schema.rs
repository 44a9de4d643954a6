//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the aggregation gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The two upstream APIs joined by `/aggregate`.
    pub upstreams: UpstreamsConfig,

    /// Circuit breaker settings, applied to each upstream independently.
    pub breaker: BreakerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Deadline for a breaker-guarded call to the given upstream.
    pub fn call_timeout(&self, upstream: &UpstreamConfig) -> Duration {
        Duration::from_millis(self.breaker.call_timeout_ms.unwrap_or(upstream.timeout_ms))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Post and user upstream definitions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    pub posts: UpstreamConfig,
    pub users: UpstreamConfig,

    /// Route upstream traffic through the `HTTP(S)_PROXY` environment proxies.
    pub use_system_proxy: bool,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            posts: UpstreamConfig::new("https://jsonplaceholder.typicode.com/posts/1"),
            users: UpstreamConfig::new("https://jsonplaceholder.typicode.com/users/1"),
            use_system_proxy: true,
        }
    }
}

/// A single upstream API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Absolute URL fetched with GET on every aggregate request.
    pub url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

fn default_upstream_timeout_ms() -> u64 {
    10_000
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Time spent Open before a probe is allowed, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Deadline for a guarded call. Falls back to the upstream's `timeout_ms`.
    pub call_timeout_ms: Option<u64>,
}

impl BreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
            call_timeout_ms: None,
        }
    }
}

/// Timeout configuration for inbound and outbound traffic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request timeout (whole request/response) in seconds.
    pub request_secs: u64,

    /// Upstream connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Idle pooled upstream connection timeout in milliseconds.
    pub idle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            connect_ms: 10_000,
            idle_ms: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
