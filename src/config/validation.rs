//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: addresses parse,
//! upstream URLs are absolute http(s), timeouts and thresholds are non-zero,
//! and the inbound request deadline outlasts every upstream call deadline.
//! All errors are collected, not just the first.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, UpstreamConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid upstream URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("observability.log_format must be 'pretty' or 'json', got '{0}'")]
    LogFormat(String),

    #[error(
        "timeouts.request_secs ({request_secs}s) must exceed the {upstream} call deadline ({call_timeout_ms}ms)"
    )]
    RequestTimeoutTooShort {
        upstream: &'static str,
        request_secs: u64,
        call_timeout_ms: u64,
    },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    check_upstream(
        &mut errors,
        ("upstreams.posts.url", "upstreams.posts.timeout_ms"),
        &config.upstreams.posts,
    );
    check_upstream(
        &mut errors,
        ("upstreams.users.url", "upstreams.users.timeout_ms"),
        &config.upstreams.users,
    );

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::Zero { field: "breaker.failure_threshold" });
    }
    if config.breaker.reset_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "breaker.reset_timeout_ms" });
    }
    if config.breaker.call_timeout_ms == Some(0) {
        errors.push(ValidationError::Zero { field: "breaker.call_timeout_ms" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    } else {
        check_request_deadline(&mut errors, config, "upstreams.posts", &config.upstreams.posts);
        check_request_deadline(&mut errors, config, "upstreams.users", &config.upstreams.users);
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_ms" });
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::LogFormat(other.to_string())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_upstream(
    errors: &mut Vec<ValidationError>,
    (url_field, timeout_field): (&'static str, &'static str),
    upstream: &UpstreamConfig,
) {
    match Url::parse(&upstream.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field: url_field,
            value: upstream.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field: url_field,
            value: upstream.url.clone(),
            reason: e.to_string(),
        }),
    }

    if upstream.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: timeout_field });
    }
}

/// The inbound deadline must strictly exceed the upstream's call deadline.
fn check_request_deadline(
    errors: &mut Vec<ValidationError>,
    config: &GatewayConfig,
    upstream: &'static str,
    upstream_config: &UpstreamConfig,
) {
    let call_timeout = config.call_timeout(upstream_config);
    if Duration::from_secs(config.timeouts.request_secs) <= call_timeout {
        errors.push(ValidationError::RequestTimeoutTooShort {
            upstream,
            request_secs: config.timeouts.request_secs,
            call_timeout_ms: call_timeout.as_millis() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstreams.users.url = "ftp://example.com/users/1".into();
        config.upstreams.posts.timeout_ms = 0;
        config.breaker.failure_threshold = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::Zero { field: "breaker.failure_threshold" }));
        assert!(errors.contains(&ValidationError::Zero { field: "upstreams.posts.timeout_ms" }));
        assert!(errors.contains(&ValidationError::LogFormat("xml".into())));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_request_deadline_must_outlast_call_deadlines() {
        let mut config = GatewayConfig::default();
        config.upstreams.users.timeout_ms = 2_000;
        config.timeouts.request_secs = 1;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::RequestTimeoutTooShort {
            upstream: "upstreams.users",
            request_secs: 1,
            call_timeout_ms: 2_000,
        }));

        config.timeouts.request_secs = 2;
        assert!(validate_config(&config).is_err(), "equal deadlines leave no headroom");

        config.timeouts.request_secs = 3;
        config.upstreams.posts.timeout_ms = 2_000;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_breaker_call_timeout_counts_against_request_deadline() {
        let mut config = GatewayConfig::default();
        config.breaker.call_timeout_ms = Some(45_000);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            ValidationError::RequestTimeoutTooShort { call_timeout_ms: 45_000, .. }
        )));
    }
}
