//! Server-Sent Events (SSE) infrastructure for real-time meeting updates.
//!
//! Each authenticated user opens one long-lived connection via `/sse`. When a
//! meeting changes status (a webhook starts it, the transcript job completes
//! it), the owner's open connections receive a `meeting_status_changed` event
//! and the UI refreshes without polling.
//!
//! Messages are ephemeral: an offline user misses the event and sees fresh
//! data on the next page load.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with a per-user secondary index
//! - `manager`: High-level message routing (delegates to ConnectionRegistry)
//! - `message`: Type-safe event and scope definitions
//! - `domain_event_handler`: Bridges `events::DomainEvent` into SSE messages

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;

pub use domain_event_handler::SseDomainEventHandler;
pub use manager::Manager;
