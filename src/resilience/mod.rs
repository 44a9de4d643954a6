//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → circuit_breaker.rs (admit, or short-circuit with CircuitOpen)
//!     → timeouts.rs (enforce the call deadline)
//!     → circuit_breaker.rs (record success/failure, transition state)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: a failed call degrades the response instead
//! - Circuit breaker prevents hammering a failing upstream

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{BreakerSettings, BreakerSnapshot, CircuitBreaker, CircuitState};
