use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Unregisters the connection when the response stream is dropped, which is also what
/// happens when the client goes away mid-stream.
struct ConnectionGuard {
    manager: Arc<::sse::Manager>,
    connection_id: ::sse::connection::ConnectionId,
    user_id: String,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!("SSE connection closed for user {}, cleaning up", self.user_id);
        self.manager.unregister_connection(&self.connection_id);
    }
}

/// SSE handler that establishes a long-lived connection for meeting status updates.
/// One connection per open client, stays open across page navigation.
pub(crate) async fn sse_handler(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing SSE connection for user {}", user.id);

    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection_id = app_state
        .sse_manager
        .register_connection(user.id.to_string(), tx);

    let guard = ConnectionGuard {
        manager: Arc::clone(&app_state.sse_manager),
        connection_id,
        user_id: user.id.to_string(),
    };

    let stream = stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
