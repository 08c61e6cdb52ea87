//! Event system infrastructure for the meetings platform.
//!
//! Domain operations publish [`DomainEvent`]s once a state change has been
//! persisted. Handlers registered with the [`EventPublisher`] react to them:
//! the SSE handler pushes status updates to connected users and the
//! transcript job queue forwards processing requests to the background worker.
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! so statuses travel as their wire strings.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
pub type Id = Uuid;

/// Domain events that represent business-level changes in the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A meeting entered `processing` with a transcript that needs to be
    /// turned into a summary. Consumed exactly by the transcript job worker.
    MeetingProcessingRequested {
        meeting_id: Id,
        transcript_url: String,
    },
    /// A meeting moved to a new lifecycle status.
    MeetingStatusChanged {
        meeting_id: Id,
        /// Wire name of the new status (e.g. `"active"`).
        status: String,
        /// Users whose open SSE connections should receive the update.
        notify_user_ids: Vec<Id>,
    },
}

impl DomainEvent {
    /// The stable event name used in logs and job payloads.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::MeetingProcessingRequested { .. } => "meetings/processing",
            DomainEvent::MeetingStatusChanged { .. } => "meetings/status_changed",
        }
    }

    /// The meeting this event concerns.
    pub fn meeting_id(&self) -> Id {
        match self {
            DomainEvent::MeetingProcessingRequested { meeting_id, .. }
            | DomainEvent::MeetingStatusChanged { meeting_id, .. } => *meeting_id,
        }
    }
}

/// The serialized form of a processing request: `{name, data: {meetingId, transcriptUrl}}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobPayload {
    pub name: &'static str,
    pub data: JobData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    pub meeting_id: Id,
    pub transcript_url: String,
}

impl JobPayload {
    pub fn processing(meeting_id: Id, transcript_url: String) -> Self {
        Self {
            name: "meetings/processing",
            data: JobData {
                meeting_id,
                transcript_url,
            },
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// enqueueing background work, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler, returning the extended publisher.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
