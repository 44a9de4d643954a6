//! HTTP boundary.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware)
//!     → request.rs (assign/propagate x-request-id)
//!     → /aggregate → orchestrator
//!     → 200 JSON, or response.rs (Failure → status + structured error body)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ErrorBody};
pub use server::{AppState, HttpServer};
