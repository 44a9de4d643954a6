//! Request-aggregation gateway library.
//!
//! One inbound `GET /aggregate` fans out to a post API and a user API
//! concurrently, each guarded by its own circuit breaker, and joins the two
//! results into a single document. When one upstream fails the response
//! degrades to a partial result with a warning; when both fail the error is
//! surfaced to the client.

pub mod admin;
pub mod aggregate;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use aggregate::{AggregateResult, Orchestrator};
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
