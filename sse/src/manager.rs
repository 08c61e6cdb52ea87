use crate::connection::{ConnectionId, ConnectionRegistry, UserId};
use crate::message::{EventType, Message as SseMessage, MessageScope};
use axum::response::sse::Event;
use log::*;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;

/// Routes meeting updates to the browsers of the users they concern.
pub struct Manager {
    registry: ConnectionRegistry,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn register_connection(
        &self,
        user_id: UserId,
        sender: UnboundedSender<Result<Event, Infallible>>,
    ) -> ConnectionId {
        let connection_id = self.registry.register(user_id.clone(), sender);
        debug!(
            "Opened SSE connection {} for user {user_id} ({} open)",
            connection_id.as_str(),
            self.registry.connection_count(&user_id)
        );
        connection_id
    }

    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        debug!("Closing SSE connection {}", connection_id.as_str());
        self.registry.unregister(connection_id);
    }

    pub fn connection_count(&self, user_id: &UserId) -> usize {
        self.registry.connection_count(user_id)
    }

    /// Delivers the message to every connection in its scope and returns how many were
    /// reached. Users without an open connection simply miss the update.
    pub fn send_message(&self, message: SseMessage) -> usize {
        let event_data = match serde_json::to_string(&message.event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize SSE event: {e}");
                return 0;
            }
        };
        let event = Event::default()
            .event(message.event.event_type())
            .data(event_data);

        match message.scope {
            MessageScope::User { user_id } => {
                let delivered = self.registry.send_to_user(&user_id, event);
                trace!("SSE event reached {delivered} connection(s) of user {user_id}");
                delivered
            }
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Event as SseEvent;
    use tokio::sync::mpsc;

    fn status_changed(user_id: &str) -> SseMessage {
        SseMessage {
            event: SseEvent::MeetingStatusChanged {
                meeting_id: "m-1".to_string(),
                status: "completed".to_string(),
            },
            scope: MessageScope::User {
                user_id: user_id.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn every_tab_of_the_owner_receives_the_update() {
        let manager = Manager::new();
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();
        manager.register_connection("ana".to_string(), first_tx);
        manager.register_connection("ana".to_string(), second_tx);

        assert_eq!(manager.send_message(status_changed("ana")), 2);
        assert!(first_rx.try_recv().is_ok());
        assert!(second_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn offline_users_miss_the_update() {
        let manager = Manager::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection_id = manager.register_connection("ana".to_string(), tx);
        manager.unregister_connection(&connection_id);

        assert_eq!(manager.send_message(status_changed("ana")), 0);
        assert_eq!(manager.connection_count(&"ana".to_string()), 0);
    }
}
