use crate::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Converts domain events into SSE messages for the users named in the event.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }

    fn send_to_users(&self, sse_event: SseEvent, user_ids: &[events::Id]) {
        let delivered: usize = user_ids
            .iter()
            .map(|user_id| {
                self.sse_manager.send_message(SseMessage {
                    event: sse_event.clone(),
                    scope: MessageScope::User {
                        user_id: user_id.to_string(),
                    },
                })
            })
            .sum();

        debug!(
            "Sent SSE event to {delivered} connection(s) of {} user(s)",
            user_ids.len()
        );
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::MeetingStatusChanged {
                meeting_id,
                status,
                notify_user_ids,
            } => {
                debug!("Handling MeetingStatusChanged event for meeting {meeting_id}: {status}");

                let sse_event = SseEvent::MeetingStatusChanged {
                    meeting_id: meeting_id.to_string(),
                    status: status.clone(),
                };

                self.send_to_users(sse_event, notify_user_ids);
            }
            // Consumed by the transcript job queue
            DomainEvent::MeetingProcessingRequested { .. } => {}
        }
    }
}
