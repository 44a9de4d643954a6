//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Surface an elapsed deadline as a `Timeout` failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeout failures are distinct from transport failures (504 vs 502)

use std::future::Future;
use std::time::Duration;

use crate::aggregate::outcome::{CallOutcome, Failure};
use crate::upstream::Upstream;

/// Run `call` to completion or until `deadline` elapses.
pub async fn with_deadline<F>(upstream: Upstream, deadline: Duration, call: F) -> CallOutcome
where
    F: Future<Output = CallOutcome>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(
                upstream = %upstream,
                deadline_ms = deadline.as_millis() as u64,
                "Upstream call exceeded deadline"
            );
            Err(Failure::timeout(upstream))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::outcome::{FailureKind, UpstreamBody};

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let outcome = with_deadline(Upstream::Posts, Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(UpstreamBody::default())
        })
        .await;

        assert_eq!(outcome.unwrap_err().kind, FailureKind::Timeout);
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let outcome = with_deadline(Upstream::Users, Duration::from_secs(1), async {
            Err(Failure::upstream_status(Upstream::Users, 500))
        })
        .await;

        assert_eq!(
            outcome.unwrap_err().kind,
            FailureKind::UpstreamStatus { status: 500 }
        );
    }
}
