//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_aggregate_requests_total` (counter): by outcome (complete, partial, failed)
//! - `gateway_aggregate_duration_seconds` (histogram): fan-out/join latency
//! - `gateway_upstream_calls_total` (counter): by upstream and result
//! - `gateway_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `gateway_breaker_transitions_total` (counter): by upstream and target state
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::aggregate::outcome::CallOutcome;
use crate::resilience::circuit_breaker::CircuitState;
use crate::upstream::Upstream;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_aggregate(outcome: &'static str, started: Instant) {
    counter!("gateway_aggregate_requests_total", "outcome" => outcome).increment(1);
    histogram!("gateway_aggregate_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_upstream_call(upstream: Upstream, outcome: &CallOutcome) {
    let result = match outcome {
        Ok(_) => "success",
        Err(failure) => failure.kind.as_str(),
    };
    counter!(
        "gateway_upstream_calls_total",
        "upstream" => upstream.name(),
        "result" => result
    )
    .increment(1);
}

pub fn record_breaker_state(upstream: Upstream, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("gateway_breaker_state", "upstream" => upstream.name()).set(value);
}

pub fn record_breaker_transition(upstream: Upstream, to: CircuitState) {
    counter!(
        "gateway_breaker_transitions_total",
        "upstream" => upstream.name(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(upstream, to);
}
