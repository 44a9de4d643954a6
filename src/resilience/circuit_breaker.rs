//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast with `CircuitOpen`
//! - Half-Open: a single probe call tests whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: reset_timeout elapsed (checked when a call arrives)
//! Half-Open → Closed: probe succeeds
//! Half-Open → Open: probe fails, reset timer restarts
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, no shared state between breakers
//! - Fail fast in Open state without invoking the upstream
//! - Single probe in Half-Open; other calls short-circuit until it settles
//! - The state mutex is never held across an await point

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::aggregate::outcome::{CallOutcome, Failure};
use crate::config::{GatewayConfig, UpstreamConfig};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::upstream::Upstream;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Tuning for a single breaker.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
    pub call_timeout: Duration,
}

impl BreakerSettings {
    /// Settings for one upstream; the call deadline defaults to its request timeout.
    pub fn from_config(config: &GatewayConfig, upstream: &UpstreamConfig) -> Self {
        Self {
            failure_threshold: config.breaker.failure_threshold,
            reset_timeout: config.breaker.reset_timeout(),
            call_timeout: config.call_timeout(upstream),
        }
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Point-in-time view of a breaker, for operators.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub upstream: Upstream,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Milliseconds since the last state transition.
    pub since_ms: u64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    last_transition: Instant,
    probe_in_flight: bool,
}

impl BreakerState {
    fn transition(&mut self, to: CircuitState) -> Transition {
        let from = self.state;
        self.state = to;
        self.last_transition = Instant::now();
        Transition {
            from,
            to,
            consecutive_failures: self.consecutive_failures,
        }
    }
}

#[derive(Debug)]
struct Transition {
    from: CircuitState,
    to: CircuitState,
    consecutive_failures: u32,
}

/// Per-upstream circuit breaker, shared by all concurrent requests.
#[derive(Debug)]
pub struct CircuitBreaker {
    upstream: Upstream,
    settings: BreakerSettings,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(upstream: Upstream, settings: BreakerSettings) -> Self {
        metrics::record_breaker_state(upstream, CircuitState::Closed);
        Self {
            upstream,
            settings,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_transition: Instant::now(),
                probe_in_flight: false,
            }),
        }
    }

    pub fn upstream(&self) -> Upstream {
        self.upstream
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    /// Current state, without evaluating the reset timer.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            upstream: self.upstream,
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            since_ms: inner.last_transition.elapsed().as_millis() as u64,
        }
    }

    /// Run `operation` through the breaker.
    ///
    /// Short-circuits to `CircuitOpen` without calling `operation` when the
    /// circuit is open. A call that outlives `call_timeout` is abandoned and
    /// counted as a `Timeout` failure.
    pub async fn execute<F, Fut>(&self, operation: F) -> CallOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CallOutcome>,
    {
        let Some(permit) = self.try_acquire() else {
            tracing::debug!(upstream = %self.upstream, "Circuit open, short-circuiting call");
            return Err(Failure::circuit_open(self.upstream));
        };

        let outcome = with_deadline(self.upstream, self.settings.call_timeout, operation()).await;
        permit.settle(&outcome);
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // Mutations are plain stores, so a poisoned lock still holds a valid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Option<Permit<'_>> {
        let (admitted, transition) = {
            let mut inner = self.lock();
            match inner.state {
                CircuitState::Closed => (Some(false), None),
                CircuitState::Open => {
                    if inner.last_transition.elapsed() >= self.settings.reset_timeout {
                        inner.probe_in_flight = true;
                        (Some(true), Some(inner.transition(CircuitState::HalfOpen)))
                    } else {
                        (None, None)
                    }
                }
                CircuitState::HalfOpen => {
                    if inner.probe_in_flight {
                        (None, None)
                    } else {
                        inner.probe_in_flight = true;
                        (Some(true), None)
                    }
                }
            }
        };

        if let Some(t) = transition {
            self.announce(t);
        }

        admitted.map(|probe| Permit {
            breaker: self,
            probe,
            settled: false,
        })
    }

    fn on_success(&self, probe: bool) {
        let transition = {
            let mut inner = self.lock();
            inner.consecutive_failures = 0;
            if probe {
                inner.probe_in_flight = false;
            }
            if probe && inner.state == CircuitState::HalfOpen {
                Some(inner.transition(CircuitState::Closed))
            } else {
                None
            }
        };

        if let Some(t) = transition {
            self.announce(t);
        }
    }

    fn on_failure(&self, probe: bool) {
        let transition = {
            let mut inner = self.lock();
            inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
            if probe {
                inner.probe_in_flight = false;
            }
            match inner.state {
                CircuitState::HalfOpen if probe => Some(inner.transition(CircuitState::Open)),
                CircuitState::Closed
                    if inner.consecutive_failures >= self.settings.failure_threshold =>
                {
                    Some(inner.transition(CircuitState::Open))
                }
                _ => None,
            }
        };

        if let Some(t) = transition {
            self.announce(t);
        }
    }

    fn release_probe(&self) {
        self.lock().probe_in_flight = false;
    }

    fn announce(&self, t: Transition) {
        match t.to {
            CircuitState::Open => tracing::warn!(
                upstream = %self.upstream,
                from = t.from.as_str(),
                to = t.to.as_str(),
                consecutive_failures = t.consecutive_failures,
                reset_timeout_ms = self.settings.reset_timeout.as_millis() as u64,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                upstream = %self.upstream,
                from = t.from.as_str(),
                to = t.to.as_str(),
                consecutive_failures = t.consecutive_failures,
                "Circuit breaker state changed"
            ),
        }
        metrics::record_breaker_transition(self.upstream, t.to);
    }
}

/// Admission to call the upstream.
///
/// Dropping an unsettled probe permit (the caller was cancelled) frees the
/// half-open slot so the next call can probe.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl Permit<'_> {
    fn settle(mut self, outcome: &CallOutcome) {
        self.settled = true;
        match outcome {
            Ok(_) => self.breaker.on_success(self.probe),
            Err(_) => self.breaker.on_failure(self.probe),
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.settled {
            self.breaker.release_probe();
        }
    }
}
