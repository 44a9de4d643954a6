//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Build breakers + orchestrator → Bind
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT or Shutdown::trigger → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: invalid config or bind failure is fatal at startup
//! - In-flight aggregate requests finish; every upstream call is deadline-bounded

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
