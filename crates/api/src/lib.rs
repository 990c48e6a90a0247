//! HTTP API layer for gridwatch.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: outage report intake, lifecycle and exports, plus the
//!   per-user notification inbox
//! - **Extractors**: token authentication
//! - **Streaming**: WebSocket fan-out of outage events
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod streaming;

pub use endpoints::router;
pub use streaming::{StreamingPublisher, StreamingState, streaming_handler};
