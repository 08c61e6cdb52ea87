//! Business logic of the meetings platform.
//!
//! Web controllers and the background job worker call into this crate; it in turn
//! talks to the record store through `entity_api` and to external platforms through
//! the `meeting-ai` provider traits. Consumers do not need to depend on `entity_api`
//! directly: the entity modules and update helpers are re-exported here.
pub use entity_api::mutate::{IntoUpdateMap, UpdateMap};

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    agents, meeting_status, meetings, stream_token, transcript_entry, users, Id,
};

pub mod agent;
pub mod call_event;
pub mod caller;
pub mod error;
pub mod meeting;
pub mod transcript_job;
pub mod user;
pub mod voice_bridge;
pub mod voice_session;

pub mod gateway;

#[cfg(test)]
pub(crate) mod test_support;

pub use caller::AuthenticatedCaller;
