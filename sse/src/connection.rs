use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;

// The web layer converts entity ids to strings before registering
pub type UserId = String;

/// Server-generated identifier for one open SSE stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub user_id: UserId,
    pub sender: UnboundedSender<Result<Event, Infallible>>,
}

/// Connection registry indexed both by connection and by user
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    user_index: DashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_index: DashMap::new(),
        }
    }

    pub fn register(
        &self,
        user_id: UserId,
        sender: UnboundedSender<Result<Event, Infallible>>,
    ) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                user_id: user_id.clone(),
                sender,
            },
        );

        self.user_index
            .entry(user_id)
            .or_default()
            .insert(connection_id.clone());

        connection_id
    }

    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, info)) = self.connections.remove(connection_id) {
            let user_id = info.user_id;

            if let Some(mut entry) = self.user_index.get_mut(&user_id) {
                entry.remove(connection_id);

                if entry.is_empty() {
                    // Release the shard lock before removing the key
                    drop(entry);
                    self.user_index.remove(&user_id);
                }
            }
        }
    }

    /// Number of open connections for a user.
    pub fn connection_count(&self, user_id: &UserId) -> usize {
        self.user_index
            .get(user_id)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }

    /// Sends `event` to every open connection of the user and returns how many accepted
    /// it. Connections whose stream has gone away are dropped from the registry.
    pub fn send_to_user(&self, user_id: &UserId, event: Event) -> usize {
        let connection_ids: Vec<ConnectionId> = match self.user_index.get(user_id) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for conn_id in connection_ids {
            let sent = self
                .connections
                .get(&conn_id)
                .map(|info| info.sender.send(Ok(event.clone())).is_ok());
            match sent {
                Some(true) => delivered += 1,
                Some(false) => closed.push(conn_id),
                None => {}
            }
        }

        for conn_id in closed {
            warn!("Dropping closed SSE connection {}", conn_id.as_str());
            self.unregister(&conn_id);
        }

        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn send_to_user_reaches_only_that_users_connections() {
        let registry = ConnectionRegistry::new();
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();

        registry.register("alice".to_string(), alice_tx);
        registry.register("bob".to_string(), bob_tx);

        let delivered = registry.send_to_user(&"alice".to_string(), Event::default().data("hello"));

        assert_eq!(delivered, 1);
        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_empty_user_entries() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let user_id = "alice".to_string();

        let connection_id = registry.register(user_id.clone(), tx);
        assert_eq!(registry.connection_count(&user_id), 1);

        registry.unregister(&connection_id);
        assert_eq!(registry.connection_count(&user_id), 0);
    }

    #[tokio::test]
    async fn closed_connections_are_pruned_on_send() {
        let registry = ConnectionRegistry::new();
        let user_id = "alice".to_string();
        let (open_tx, mut open_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        registry.register(user_id.clone(), open_tx);
        registry.register(user_id.clone(), closed_tx);
        drop(closed_rx);

        let delivered = registry.send_to_user(&user_id, Event::default().data("hello"));

        assert_eq!(delivered, 1);
        assert!(open_rx.try_recv().is_ok());
        assert_eq!(registry.connection_count(&user_id), 1);
    }
}
