use serde::Serialize;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    #[serde(rename = "meeting_status_changed")]
    MeetingStatusChanged { meeting_id: String, status: String },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::MeetingStatusChanged { .. } => "meeting_status_changed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to all connections for a specific user
    User { user_id: String },
}
