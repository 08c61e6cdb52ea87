//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the `/sse` endpoint.
//! The connection registry and message types live in the `sse` crate so that
//! domain events can be routed to users without depending on `web`.

pub mod handler;
