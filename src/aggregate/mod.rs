//! Aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! GET /aggregate
//!     → orchestrator.rs (spawn post + user calls, each through its breaker)
//!     → join both CallOutcomes
//!     → classifier.rs (decision table → AggregateResult or Failure)
//!     → http boundary (200 JSON or structured error)
//! ```

pub mod classifier;
pub mod orchestrator;
pub mod outcome;

pub use classifier::classify;
pub use orchestrator::{Orchestrator, UpstreamLeg};
pub use outcome::{AggregateResult, CallOutcome, Failure, FailureKind, UpstreamBody};
