//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`tracing_layer`]: request/response tracing with `TraceLayer`.
//! - [`metrics`]: request and verification-outcome counters.
//! - [`rate_limit`]: per-client limiting of public verification.

pub mod metrics;
pub mod rate_limit;
pub mod tracing_layer;
