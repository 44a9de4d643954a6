//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamCall (url, timeout, identity)
//!     → client.rs (GET, status + body or transport error)
//!     → call.rs (200 + JSON object → Success, anything else → Failure)
//! ```

pub mod call;
pub mod client;

pub use call::{Upstream, UpstreamCall};
pub use client::{HttpUpstreamClient, TransportError, UpstreamClient, UpstreamResponse};
