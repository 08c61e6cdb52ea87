//! Call-event ingress: webhooks from the video platform.
//!
//! Deliveries are at-least-once and may arrive out of order. Every event that changes a
//! meeting does so through a conditional transition, so duplicates and late arrivals
//! become no-ops. Nothing here ever reports failure back to the sender: a rejected or
//! unprocessable delivery is logged and dropped, and the caller always acknowledges.

use crate::meeting::{publish_status, request_processing};
use crate::meeting_status::MeetingStatus;
use crate::Id;
use chrono::Utc;
use entity_api::meeting::{self as store, Transition};
use events::EventPublisher;
use log::*;
use meeting_auth::webhook::{HmacWebhookValidator, WebhookValidator};
use sea_orm::DatabaseConnection;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;

pub const SIGNATURE_HEADER: &str = "x-signature";
const PROVIDER_ID: &str = "stream_video";

#[derive(Debug, Default, Deserialize)]
struct CallRef {
    #[serde(default)]
    cid: Option<String>,
    #[serde(default)]
    transcription: Option<Transcription>,
    #[serde(default)]
    egress: Option<Egress>,
}

#[derive(Debug, Default, Deserialize)]
struct Transcription {
    #[serde(default)]
    closed_captions_files: Vec<FileRef>,
}

#[derive(Debug, Default, Deserialize)]
struct Egress {
    #[serde(default)]
    transcriptions: Vec<FileRef>,
}

#[derive(Debug, Default, Deserialize)]
struct FileRef {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Participant {
    #[serde(default)]
    user: Option<ParticipantUser>,
}

#[derive(Debug, Default, Deserialize)]
struct ParticipantUser {
    #[serde(default)]
    id: Option<String>,
}

/// The call-platform events this service understands, keyed by the payload's `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum CallEvent {
    #[serde(rename = "call.session_started")]
    SessionStarted {
        #[serde(default)]
        call: Option<CallRef>,
    },
    #[serde(rename = "call.session_ended")]
    SessionEnded {
        #[serde(default)]
        call: Option<CallRef>,
    },
    #[serde(rename = "call.transcription_ready")]
    TranscriptionReady {
        #[serde(default)]
        call_cid: Option<String>,
        #[serde(default)]
        call: Option<CallRef>,
        #[serde(default)]
        call_transcription: Option<FileRef>,
        #[serde(default)]
        transcription: Option<FileRef>,
    },
    #[serde(rename = "call.session_participant_joined")]
    ParticipantJoined {
        #[serde(default)]
        call: Option<CallRef>,
        #[serde(default)]
        participant: Option<Participant>,
    },
    #[serde(other)]
    Unknown,
}

impl CallRef {
    fn session_transcript_url(&self) -> Option<String> {
        let closed_captions = self
            .transcription
            .as_ref()
            .and_then(|t| t.closed_captions_files.first())
            .and_then(|f| f.url.clone());
        let egress = || {
            self.egress
                .as_ref()
                .and_then(|e| e.transcriptions.first())
                .and_then(|f| f.url.clone())
        };
        closed_captions.or_else(egress).filter(|url| !url.is_empty())
    }
}

/// What became of one delivery. The HTTP response is the same in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Failed verification or could not be read
    Dropped,
    /// Understood, but there was nothing to change
    Ignored,
    /// The meeting moved to the given status
    Transitioned(MeetingStatus),
}

/// Extracts the meeting id from a composite call id `"<call_type>:<meeting_id>"`.
pub fn meeting_id_from_cid(cid: &str) -> Option<Id> {
    let meeting_id = cid.split(':').nth(1)?;
    entity_api::parse_id(meeting_id).ok()
}

/// Verifies and dispatches call-platform webhooks.
pub struct CallEventIngress {
    validator: Option<HmacWebhookValidator>,
}

impl CallEventIngress {
    /// Without a secret nothing can be verified, so every delivery is dropped.
    pub fn new(webhook_secret: Option<String>) -> Self {
        if webhook_secret.is_none() {
            warn!("No webhook secret configured; call-platform events will be dropped");
        }
        Self {
            validator: webhook_secret.map(|secret| {
                HmacWebhookValidator::new(PROVIDER_ID, SecretString::new(secret), SIGNATURE_HEADER)
            }),
        }
    }

    pub async fn handle(
        &self,
        db: &DatabaseConnection,
        events: &EventPublisher,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> Outcome {
        info!("Webhook received ({} bytes)", body.len());

        if !self.verify(headers, body) {
            return Outcome::Dropped;
        }

        let event: CallEvent = match serde_json::from_slice(body) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping webhook with unreadable body: {e}");
                return Outcome::Dropped;
            }
        };

        match dispatch(db, events, event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Dropping webhook after store error: {e}");
                Outcome::Dropped
            }
        }
    }

    fn verify(&self, headers: &HashMap<String, String>, body: &[u8]) -> bool {
        let Some(validator) = &self.validator else {
            warn!("Dropping webhook: no secret configured");
            return false;
        };

        match validator.validate(headers, body) {
            Ok(true) => true,
            Ok(false) => {
                warn!("Dropping webhook: signature mismatch");
                false
            }
            Err(e) => {
                warn!("Dropping webhook: {e}");
                false
            }
        }
    }
}

fn meeting_id_of(call: Option<&CallRef>) -> Option<Id> {
    let cid = call.and_then(|c| c.cid.as_deref())?;
    let meeting_id = meeting_id_from_cid(cid);
    if meeting_id.is_none() {
        warn!("No meeting id in call id {cid:?}");
    }
    meeting_id
}

async fn dispatch(
    db: &DatabaseConnection,
    events: &EventPublisher,
    event: CallEvent,
) -> Result<Outcome, entity_api::error::Error> {
    match event {
        CallEvent::SessionStarted { call } => {
            let Some(meeting_id) = meeting_id_of(call.as_ref()) else {
                return Ok(Outcome::Ignored);
            };
            session_started(db, events, meeting_id).await
        }
        CallEvent::SessionEnded { call } => {
            let Some(meeting_id) = meeting_id_of(call.as_ref()) else {
                return Ok(Outcome::Ignored);
            };
            let transcript_url = call.as_ref().and_then(CallRef::session_transcript_url);
            session_ended(db, events, meeting_id, transcript_url).await
        }
        CallEvent::TranscriptionReady {
            call_cid,
            call,
            call_transcription,
            transcription,
        } => {
            let cid = call_cid.or_else(|| call.and_then(|c| c.cid));
            let Some(meeting_id) = cid.as_deref().and_then(meeting_id_from_cid) else {
                warn!("Transcription ready without a usable call id");
                return Ok(Outcome::Ignored);
            };
            let transcript_url = call_transcription
                .and_then(|f| f.url)
                .or_else(|| transcription.and_then(|f| f.url))
                .filter(|url| !url.is_empty());
            let Some(transcript_url) = transcript_url else {
                warn!("Transcription ready for meeting {meeting_id} without a url");
                return Ok(Outcome::Ignored);
            };
            transcription_ready(db, events, meeting_id, transcript_url).await
        }
        CallEvent::ParticipantJoined { call, participant } => {
            let user_id = participant
                .and_then(|p| p.user)
                .and_then(|u| u.id)
                .unwrap_or_else(|| "unknown".to_string());
            let cid = call.and_then(|c| c.cid).unwrap_or_default();
            info!("Participant {user_id} joined call {cid}");
            Ok(Outcome::Ignored)
        }
        CallEvent::Unknown => {
            debug!("Ignoring unhandled call event type");
            Ok(Outcome::Ignored)
        }
    }
}

async fn session_started(
    db: &DatabaseConnection,
    events: &EventPublisher,
    meeting_id: Id,
) -> Result<Outcome, entity_api::error::Error> {
    let rows = store::transition(
        db,
        meeting_id,
        Transition::to(MeetingStatus::Active)
            .from(&[MeetingStatus::Upcoming])
            .started_at(Utc::now()),
    )
    .await?;

    if rows == 0 {
        debug!("Session started for meeting {meeting_id}, which is not upcoming");
        return Ok(Outcome::Ignored);
    }

    let meeting = store::find_by_id(db, meeting_id).await?;
    match entity_api::agent::find_by_id(db, meeting.agent_id).await {
        Ok(agent) => info!("Meeting {meeting_id} activated with agent {}", agent.name),
        Err(_) => warn!("Meeting {meeting_id} activated but agent {} is missing", meeting.agent_id),
    }
    publish_status(events, &meeting).await;

    Ok(Outcome::Transitioned(MeetingStatus::Active))
}

async fn session_ended(
    db: &DatabaseConnection,
    events: &EventPublisher,
    meeting_id: Id,
    transcript_url: Option<String>,
) -> Result<Outcome, entity_api::error::Error> {
    let target = match transcript_url {
        Some(_) => MeetingStatus::Processing,
        None => MeetingStatus::Completed,
    };
    debug!("Session ended for meeting {meeting_id}, transcript: {transcript_url:?}");

    let rows = store::transition(
        db,
        meeting_id,
        Transition::to(target)
            .from(&[MeetingStatus::Active])
            .ended_at(Utc::now())
            .transcript_url(transcript_url.clone()),
    )
    .await?;

    if rows == 0 {
        debug!("Meeting {meeting_id} was not active, session end ignored");
        return Ok(Outcome::Ignored);
    }

    if let Some(transcript_url) = transcript_url {
        request_processing(events, meeting_id, transcript_url).await;
    }
    let meeting = store::find_by_id(db, meeting_id).await?;
    publish_status(events, &meeting).await;

    Ok(Outcome::Transitioned(target))
}

/// A transcript that arrives after the session ended. Only a meeting that is still
/// active and unsummarized moves on, so a transcript already delivered with the
/// session end is never enqueued twice.
async fn transcription_ready(
    db: &DatabaseConnection,
    events: &EventPublisher,
    meeting_id: Id,
    transcript_url: String,
) -> Result<Outcome, entity_api::error::Error> {
    let rows = store::transition(
        db,
        meeting_id,
        Transition::to(MeetingStatus::Processing)
            .from(&[MeetingStatus::Active])
            .without_summary()
            .ended_at(Utc::now())
            .transcript_url(Some(transcript_url.clone())),
    )
    .await?;

    if rows == 0 {
        debug!("Transcript for meeting {meeting_id} already handled");
        return Ok(Outcome::Ignored);
    }

    request_processing(events, meeting_id, transcript_url).await;
    let meeting = store::find_by_id(db, meeting_id).await?;
    publish_status(events, &meeting).await;

    Ok(Outcome::Transitioned(MeetingStatus::Processing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_id_is_the_second_cid_segment() {
        let id = Id::new_v4();
        assert_eq!(meeting_id_from_cid(&format!("default:{id}")), Some(id));
        assert_eq!(meeting_id_from_cid("default"), None);
        assert_eq!(meeting_id_from_cid("default:not-a-uuid"), None);
    }

    #[test]
    fn session_end_prefers_closed_captions_over_egress() {
        let event: CallEvent = serde_json::from_str(
            r#"{"type": "call.session_ended", "call": {
                "cid": "default:x",
                "transcription": {"closed_captions_files": [{"url": "https://cc"}]},
                "egress": {"transcriptions": [{"url": "https://egress"}]}
            }}"#,
        )
        .unwrap();

        let CallEvent::SessionEnded { call: Some(call) } = event else {
            panic!("expected a session end");
        };
        assert_eq!(call.session_transcript_url().as_deref(), Some("https://cc"));
    }

    #[test]
    fn session_end_falls_back_to_egress_transcriptions() {
        let call: CallRef = serde_json::from_str(
            r#"{"cid": "default:x", "egress": {"transcriptions": [{"url": "https://egress"}]}}"#,
        )
        .unwrap();

        assert_eq!(call.session_transcript_url().as_deref(), Some("https://egress"));
    }

    #[test]
    fn unknown_event_types_parse_to_the_no_op_arm() {
        let event: CallEvent =
            serde_json::from_str(r#"{"type": "call.recording_ready", "call": {}}"#).unwrap();
        assert!(matches!(event, CallEvent::Unknown));
    }
}
