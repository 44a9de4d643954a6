//! Aggregation orchestrator.
//!
//! # Responsibilities
//! - Fan out the post and user calls concurrently, each through its own breaker
//! - Join on both outcomes, whichever settles first
//! - Hand the pair to the classifier and return its verdict
//!
//! # Design Decisions
//! - Each call runs on its own task; a fast failure never cancels the other call
//! - Breakers are injected, so they outlive any single request
//! - No retries here

use std::sync::Arc;
use std::time::Instant;

use tokio::task::{JoinError, JoinHandle};

use crate::aggregate::classifier::classify;
use crate::aggregate::outcome::{AggregateResult, CallOutcome, Failure};
use crate::config::{GatewayConfig, UpstreamConfig};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{BreakerSettings, BreakerSnapshot, CircuitBreaker};
use crate::upstream::{Upstream, UpstreamCall, UpstreamClient};

/// An upstream call paired with the breaker that guards it.
#[derive(Debug, Clone)]
pub struct UpstreamLeg {
    call: Arc<UpstreamCall>,
    breaker: Arc<CircuitBreaker>,
}

impl UpstreamLeg {
    pub fn new(call: UpstreamCall, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            call: Arc::new(call),
            breaker,
        }
    }

    pub fn upstream(&self) -> Upstream {
        self.call.upstream
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

/// Joins the post and user upstreams into one response.
pub struct Orchestrator {
    client: Arc<dyn UpstreamClient>,
    posts: UpstreamLeg,
    users: UpstreamLeg,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn UpstreamClient>, posts: UpstreamLeg, users: UpstreamLeg) -> Self {
        Self {
            client,
            posts,
            users,
        }
    }

    /// Build both legs and their breakers from configuration.
    pub fn from_config(config: &GatewayConfig, client: Arc<dyn UpstreamClient>) -> Self {
        let leg = |upstream: Upstream, cfg: &UpstreamConfig| {
            let call = UpstreamCall::new(upstream, &cfg.url, config.call_timeout(cfg));
            let breaker = CircuitBreaker::new(upstream, BreakerSettings::from_config(config, cfg));
            UpstreamLeg::new(call, Arc::new(breaker))
        };

        Self::new(
            client,
            leg(Upstream::Posts, &config.upstreams.posts),
            leg(Upstream::Users, &config.upstreams.users),
        )
    }

    /// Serve one aggregate request.
    pub async fn handle(&self) -> Result<AggregateResult, Failure> {
        let started = Instant::now();

        // Both tasks are in flight before either is awaited.
        let posts = self.spawn(&self.posts);
        let users = self.spawn(&self.users);
        let (posts, users) = tokio::join!(posts, users);

        let post_outcome = settle(self.posts.upstream(), posts);
        let user_outcome = settle(self.users.upstream(), users);

        let label = match (&post_outcome, &user_outcome) {
            (Ok(_), Ok(_)) => "complete",
            (Err(_), Err(_)) => "failed",
            _ => "partial",
        };
        let verdict = classify(&post_outcome, &user_outcome);

        match &verdict {
            Ok(result) if result.warning.is_some() => tracing::warn!(
                warning = result.warning.as_deref().unwrap_or_default(),
                "Serving partial aggregate"
            ),
            Ok(_) => tracing::debug!("Aggregate complete"),
            Err(failure) => tracing::error!(
                upstream = %failure.upstream,
                kind = failure.kind.as_str(),
                error = %failure,
                "Both upstreams failed"
            ),
        }
        metrics::record_aggregate(label, started);

        verdict
    }

    pub fn breakers(&self) -> [&Arc<CircuitBreaker>; 2] {
        [self.posts.breaker(), self.users.breaker()]
    }

    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        self.breakers().iter().map(|b| b.snapshot()).collect()
    }

    fn spawn(&self, leg: &UpstreamLeg) -> JoinHandle<CallOutcome> {
        let client = self.client.clone();
        let leg = leg.clone();

        tokio::spawn(async move {
            let outcome = leg
                .breaker
                .execute(|| leg.call.fetch(client.as_ref()))
                .await;
            metrics::record_upstream_call(leg.upstream(), &outcome);
            outcome
        })
    }
}

fn settle(upstream: Upstream, joined: Result<CallOutcome, JoinError>) -> CallOutcome {
    joined.unwrap_or_else(|e| {
        tracing::error!(upstream = %upstream, error = %e, "Upstream task did not complete");
        Err(Failure::internal(upstream, e.to_string()))
    })
}
