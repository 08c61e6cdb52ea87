//! Realtime voice bridge status model.
//!
//! Tracks an agent's live voice connection: `idle -> connecting -> listening <-> speaking`,
//! with `error` reachable from setup or from a protocol error mid-call. Media itself is
//! handled by a [`MediaTransport`]; this type only negotiates the session and follows
//! the signaling events the platform sends over the data channel.
//!
//! The bridge is independent of the meeting lifecycle: a failed connection never
//! changes a meeting's status.

use crate::error::Error;
use async_trait::async_trait;
use log::*;
use meeting_ai::traits::realtime;
use meeting_ai::types::realtime::SessionConfig;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BridgeStatus {
    #[default]
    Idle,
    Connecting,
    Listening,
    Speaking,
    Error,
}

/// The peer connection carrying audio and the signaling data channel.
#[async_trait]
pub trait MediaTransport: Send {
    /// Creates the local SDP offer.
    async fn create_offer(&mut self) -> Result<String, Error>;

    async fn apply_answer(&mut self, answer_sdp: &str) -> Result<(), Error>;

    /// Releases microphone, data channel and peer connection. Safe to call repeatedly.
    fn close(&mut self);
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Signaling events, keyed by their `type` tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ServerEvent {
    #[serde(rename = "response.audio.delta")]
    AudioDelta {},
    #[serde(rename = "response.audio.done")]
    AudioDone {},
    #[serde(rename = "response.audio_transcript.delta")]
    TranscriptDelta {
        #[serde(default)]
        delta: String,
    },
    #[serde(rename = "response.audio_transcript.done")]
    TranscriptDone {},
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    InputTranscriptionCompleted {
        #[serde(default)]
        transcript: String,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: Option<ErrorBody>,
    },
    #[serde(other)]
    Unknown,
}

pub struct VoiceBridge<T: MediaTransport> {
    status: BridgeStatus,
    transport: T,
    provider: Arc<dyn realtime::Provider>,
    agent_transcript: String,
    user_transcript: String,
    last_error: Option<String>,
}

impl<T: MediaTransport> VoiceBridge<T> {
    pub fn new(transport: T, provider: Arc<dyn realtime::Provider>) -> Self {
        Self {
            status: BridgeStatus::Idle,
            transport,
            provider,
            agent_transcript: String::new(),
            user_transcript: String::new(),
            last_error: None,
        }
    }

    pub fn status(&self) -> BridgeStatus {
        self.status
    }

    /// What the agent is saying in the current response.
    pub fn agent_transcript(&self) -> &str {
        &self.agent_transcript
    }

    /// The user's last completed utterance.
    pub fn user_transcript(&self) -> &str {
        &self.user_transcript
    }

    /// Message to show the user after a failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Opens a session and negotiates media. Any failure leaves the bridge in `Error`
    /// with the transport released.
    pub async fn connect(&mut self, config: SessionConfig) -> BridgeStatus {
        self.status = BridgeStatus::Connecting;
        self.last_error = None;

        if let Err(e) = self.negotiate(config).await {
            warn!("Voice bridge failed to connect: {e}");
            self.transport.close();
            self.fail(e.to_string());
        }

        self.status
    }

    async fn negotiate(&mut self, config: SessionConfig) -> Result<(), Error> {
        let model = config.model.clone();
        let session = self.provider.create_session(config).await?;
        debug!("Voice session {} created", session.session_id);

        let offer = self.transport.create_offer().await?;
        let answer = self
            .provider
            .exchange_sdp(&session.client_secret, &model, &offer)
            .await?;
        self.transport.apply_answer(&answer).await?;

        Ok(())
    }

    /// The agent's audio track arrived.
    pub fn on_remote_track(&mut self) {
        if self.status == BridgeStatus::Connecting {
            self.status = BridgeStatus::Listening;
        }
    }

    /// Applies one data-channel message. Malformed and unknown messages are ignored.
    pub fn handle_message(&mut self, message: &str) -> BridgeStatus {
        let event: ServerEvent = match serde_json::from_str(message) {
            Ok(event) => event,
            Err(e) => {
                trace!("Ignoring unreadable voice event: {e}");
                return self.status;
            }
        };

        match event {
            ServerEvent::AudioDelta {} if self.is_conversing() => {
                self.status = BridgeStatus::Speaking
            }
            ServerEvent::AudioDone {} if self.is_conversing() => {
                self.status = BridgeStatus::Listening
            }
            ServerEvent::AudioDelta {} | ServerEvent::AudioDone {} => {
                trace!("Ignoring agent audio while {:?}", self.status)
            }
            ServerEvent::TranscriptDelta { delta } => self.agent_transcript.push_str(&delta),
            ServerEvent::TranscriptDone {} => self.agent_transcript.clear(),
            ServerEvent::InputTranscriptionCompleted { transcript } => {
                self.user_transcript = transcript
            }
            ServerEvent::Error { error } => {
                let message = error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "Unknown error".to_string());
                warn!("Voice platform reported an error: {message}");
                self.fail(message);
            }
            ServerEvent::Unknown => {}
        }

        self.status
    }

    /// Tears down the session from any state.
    pub fn disconnect(&mut self) {
        self.transport.close();
        self.status = BridgeStatus::Idle;
        self.agent_transcript.clear();
        self.user_transcript.clear();
    }

    fn is_conversing(&self) -> bool {
        matches!(self.status, BridgeStatus::Listening | BridgeStatus::Speaking)
    }

    fn fail(&mut self, message: String) {
        self.status = BridgeStatus::Error;
        self.last_error = Some(message);
    }
}

impl<T: MediaTransport> Drop for VoiceBridge<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRealtime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeTransport {
        closes: Arc<AtomicUsize>,
        answer: Arc<std::sync::Mutex<Option<String>>>,
        fail_offer: bool,
    }

    #[async_trait]
    impl MediaTransport for FakeTransport {
        async fn create_offer(&mut self) -> Result<String, Error> {
            if self.fail_offer {
                return Err(Error::config("microphone unavailable"));
            }
            Ok("v=0 offer".to_string())
        }

        async fn apply_answer(&mut self, answer_sdp: &str) -> Result<(), Error> {
            *self.answer.lock().unwrap() = Some(answer_sdp.to_string());
            Ok(())
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config() -> SessionConfig {
        SessionConfig::new("gpt-4o-realtime-preview", "alloy", "Be brief.")
    }

    #[tokio::test]
    async fn connect_negotiates_with_the_session_secret() {
        let transport = FakeTransport::default();
        let answer = Arc::clone(&transport.answer);
        let mut bridge = VoiceBridge::new(transport, Arc::new(FakeRealtime::default()));

        assert_eq!(bridge.connect(config()).await, BridgeStatus::Connecting);
        bridge.on_remote_track();

        assert_eq!(bridge.status(), BridgeStatus::Listening);
        assert_eq!(
            answer.lock().unwrap().as_deref(),
            Some("answer[ek_test](v=0 offer)")
        );
    }

    #[tokio::test]
    async fn failed_session_moves_to_error_and_releases_the_transport() {
        let transport = FakeTransport::default();
        let closes = Arc::clone(&transport.closes);
        let provider = FakeRealtime {
            failing: true,
            ..Default::default()
        };
        let mut bridge = VoiceBridge::new(transport, Arc::new(provider));

        assert_eq!(bridge.connect(config()).await, BridgeStatus::Error);
        assert!(bridge.last_error().is_some());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_offer_moves_to_error() {
        let transport = FakeTransport {
            fail_offer: true,
            ..Default::default()
        };
        let mut bridge = VoiceBridge::new(transport, Arc::new(FakeRealtime::default()));

        assert_eq!(bridge.connect(config()).await, BridgeStatus::Error);
    }

    #[tokio::test]
    async fn audio_activity_alternates_listening_and_speaking() {
        let mut bridge = VoiceBridge::new(FakeTransport::default(), Arc::new(FakeRealtime::default()));
        bridge.connect(config()).await;
        bridge.on_remote_track();

        assert_eq!(
            bridge.handle_message(r#"{"type": "response.audio.delta", "delta": "AAAA"}"#),
            BridgeStatus::Speaking
        );
        assert_eq!(
            bridge.handle_message(r#"{"type": "response.audio.done"}"#),
            BridgeStatus::Listening
        );
    }

    #[tokio::test]
    async fn late_agent_audio_does_not_leave_the_error_state() {
        let mut bridge = VoiceBridge::new(FakeTransport::default(), Arc::new(FakeRealtime::default()));
        bridge.connect(config()).await;
        bridge.on_remote_track();
        bridge.handle_message(r#"{"type": "error", "error": {"message": "rate limited"}}"#);

        assert_eq!(
            bridge.handle_message(r#"{"type": "response.audio.delta", "delta": "AAAA"}"#),
            BridgeStatus::Error
        );
        assert_eq!(
            bridge.handle_message(r#"{"type": "response.audio.done"}"#),
            BridgeStatus::Error
        );
    }

    #[test]
    fn agent_audio_before_connecting_is_ignored() {
        let mut bridge = VoiceBridge::new(FakeTransport::default(), Arc::new(FakeRealtime::default()));

        assert_eq!(
            bridge.handle_message(r#"{"type": "response.audio.delta", "delta": "AAAA"}"#),
            BridgeStatus::Idle
        );
        assert_eq!(
            bridge.handle_message(r#"{"type": "response.audio.done"}"#),
            BridgeStatus::Idle
        );
    }

    #[test]
    fn transcripts_follow_delta_and_completion_events() {
        let mut bridge = VoiceBridge::new(FakeTransport::default(), Arc::new(FakeRealtime::default()));

        bridge.handle_message(r#"{"type": "response.audio_transcript.delta", "delta": "Hel"}"#);
        bridge.handle_message(r#"{"type": "response.audio_transcript.delta", "delta": "lo"}"#);
        assert_eq!(bridge.agent_transcript(), "Hello");

        bridge.handle_message(r#"{"type": "response.audio_transcript.done"}"#);
        assert_eq!(bridge.agent_transcript(), "");

        bridge.handle_message(
            r#"{"type": "conversation.item.input_audio_transcription.completed", "transcript": "Hi agent"}"#,
        );
        assert_eq!(bridge.user_transcript(), "Hi agent");
    }

    #[test]
    fn error_events_carry_a_message() {
        let mut bridge = VoiceBridge::new(FakeTransport::default(), Arc::new(FakeRealtime::default()));

        assert_eq!(
            bridge.handle_message(r#"{"type": "error", "error": {"message": "rate limited"}}"#),
            BridgeStatus::Error
        );
        assert_eq!(bridge.last_error(), Some("rate limited"));

        bridge.handle_message(r#"{"type": "error"}"#);
        assert_eq!(bridge.last_error(), Some("Unknown error"));
    }

    #[test]
    fn malformed_and_unknown_messages_are_ignored() {
        let mut bridge = VoiceBridge::new(FakeTransport::default(), Arc::new(FakeRealtime::default()));

        assert_eq!(bridge.handle_message("not json"), BridgeStatus::Idle);
        assert_eq!(
            bridge.handle_message(r#"{"type": "session.updated", "session": {}}"#),
            BridgeStatus::Idle
        );
    }

    #[test]
    fn disconnect_is_legal_from_any_state_and_drop_releases_the_transport() {
        let transport = FakeTransport::default();
        let closes = Arc::clone(&transport.closes);
        let mut bridge = VoiceBridge::new(transport, Arc::new(FakeRealtime::default()));

        bridge.handle_message(r#"{"type": "response.audio_transcript.delta", "delta": "Hi"}"#);
        bridge.handle_message(r#"{"type": "error"}"#);
        bridge.disconnect();

        assert_eq!(bridge.status(), BridgeStatus::Idle);
        assert_eq!(bridge.agent_transcript(), "");
        assert!(bridge.last_error().is_some());

        drop(bridge);
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }
}
