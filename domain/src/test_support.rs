//! Fixtures and provider fakes shared by the unit tests in this crate.

use crate::meeting_status::MeetingStatus;
use crate::{agents, meetings, Id};
use async_trait::async_trait;
use chrono::Utc;
use events::{DomainEvent, EventHandler};
use meeting_ai::traits::{call_platform, realtime, summarizer};
use meeting_ai::types::call::{CallInfo, CallRequest, TranscriptFile};
use meeting_ai::types::realtime::{Session, SessionConfig};
use meeting_ai::types::summary::Request;
use meeting_ai::Error as AiError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn meeting_model(status: MeetingStatus) -> meetings::Model {
    let now = Utc::now();
    meetings::Model {
        id: Id::new_v4(),
        user_id: Id::new_v4(),
        agent_id: Id::new_v4(),
        name: "Weekly sync".to_string(),
        description: None,
        status,
        scheduled_at: None,
        started_at: None,
        ended_at: None,
        transcript_url: None,
        summary: None,
        user_notes: None,
        transcript_entries: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

pub(crate) fn agent_model(user_id: Id) -> agents::Model {
    let now = Utc::now();
    agents::Model {
        id: Id::new_v4(),
        user_id,
        name: "Standup facilitator".to_string(),
        instructions: "Keep everyone on time.".to_string(),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[cfg(feature = "mock")]
pub(crate) fn rows(rows_affected: u64) -> sea_orm::MockExecResult {
    sea_orm::MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

/// Records every published event.
#[derive(Clone, Default)]
pub(crate) struct EventSpy {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl EventSpy {
    pub(crate) fn processing_requests(&self) -> Vec<(Id, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                DomainEvent::MeetingProcessingRequested {
                    meeting_id,
                    transcript_url,
                } => Some((*meeting_id, transcript_url.clone())),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn status_changes(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                DomainEvent::MeetingStatusChanged { status, .. } => Some(status.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventHandler for EventSpy {
    async fn handle(&self, event: &DomainEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// In-memory call platform. Optionally fails every call or serves canned transcripts.
#[derive(Default)]
pub(crate) struct FakeCallPlatform {
    failing: bool,
    transcript_url: Option<String>,
    transcripts: HashMap<String, Result<String, u16>>,
    created: Mutex<Vec<String>>,
    ended: Mutex<Vec<String>>,
    fetches: Mutex<u32>,
}

impl FakeCallPlatform {
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub(crate) fn with_transcript(url: &str) -> Self {
        Self {
            transcript_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    /// Serves `body` for `url` from `fetch_transcript`.
    pub(crate) fn serving(mut self, url: &str, body: &str) -> Self {
        self.transcripts.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    /// Answers `fetch_transcript(url)` with an HTTP error status.
    pub(crate) fn rejecting(mut self, url: &str, status: u16) -> Self {
        self.transcripts.insert(url.to_string(), Err(status));
        self
    }

    pub(crate) fn created_calls(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub(crate) fn ended_calls(&self) -> Vec<String> {
        self.ended.lock().unwrap().clone()
    }

    pub(crate) fn fetch_count(&self) -> u32 {
        *self.fetches.lock().unwrap()
    }

    fn outage(&self) -> Result<(), AiError> {
        if self.failing {
            Err(AiError::Network("call platform unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl call_platform::Provider for FakeCallPlatform {
    async fn get_or_create_call(&self, request: CallRequest) -> Result<CallInfo, AiError> {
        self.outage()?;
        self.created.lock().unwrap().push(request.call_id.clone());
        Ok(CallInfo {
            cid: format!("{}:{}", request.call_type, request.call_id),
            ..Default::default()
        })
    }

    async fn end_call(&self, _call_type: &str, call_id: &str) -> Result<(), AiError> {
        self.outage()?;
        self.ended.lock().unwrap().push(call_id.to_string());
        Ok(())
    }

    async fn get_call(&self, call_type: &str, call_id: &str) -> Result<CallInfo, AiError> {
        self.outage()?;
        Ok(CallInfo {
            cid: format!("{call_type}:{call_id}"),
            transcript_files: self
                .transcript_url
                .iter()
                .map(|url| TranscriptFile {
                    url: url.clone(),
                    filename: None,
                    start_time: None,
                    end_time: None,
                })
                .collect(),
            ..Default::default()
        })
    }

    async fn fetch_transcript(&self, url: &str) -> Result<String, AiError> {
        *self.fetches.lock().unwrap() += 1;
        self.outage()?;
        match self.transcripts.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(AiError::Provider(format!(
                "Transcript fetch failed: {status}"
            ))),
            None => Err(AiError::NotFound(url.to_string())),
        }
    }

    fn create_user_token(&self, user_id: &str, ttl: Duration) -> Result<String, AiError> {
        self.outage()?;
        Ok(format!("token-{user_id}-{}", ttl.as_secs()))
    }

    fn api_key(&self) -> &str {
        "fake-api-key"
    }

    fn provider_id(&self) -> &str {
        "fake_call_platform"
    }
}

/// Summarizer that echoes a fixed summary, optionally after a delay.
pub(crate) struct FakeSummarizer {
    pub(crate) summary: String,
    pub(crate) delay: Option<Duration>,
    pub(crate) requests: Mutex<Vec<Request>>,
}

impl FakeSummarizer {
    pub(crate) fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn slow(summary: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(summary)
        }
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl summarizer::Provider for FakeSummarizer {
    async fn summarize(&self, request: Request) -> Result<String, AiError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.summary.clone())
    }

    fn provider_id(&self) -> &str {
        "fake_summarizer"
    }
}

/// Realtime provider that records session configs and answers every offer.
#[derive(Default)]
pub(crate) struct FakeRealtime {
    pub(crate) failing: bool,
    pub(crate) configs: Mutex<Vec<SessionConfig>>,
}

impl FakeRealtime {
    pub(crate) fn configs(&self) -> Vec<SessionConfig> {
        self.configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl realtime::Provider for FakeRealtime {
    async fn create_session(&self, config: SessionConfig) -> Result<Session, AiError> {
        if self.failing {
            return Err(AiError::Authentication("invalid api key".to_string()));
        }
        self.configs.lock().unwrap().push(config);
        Ok(Session {
            session_id: "sess_test".to_string(),
            client_secret: "ek_test".to_string(),
            expires_at: None,
        })
    }

    async fn exchange_sdp(
        &self,
        client_secret: &str,
        _model: &str,
        offer_sdp: &str,
    ) -> Result<String, AiError> {
        if self.failing {
            return Err(AiError::Authentication("invalid client secret".to_string()));
        }
        Ok(format!("answer[{client_secret}]({offer_sdp})"))
    }

    fn provider_id(&self) -> &str {
        "fake_realtime"
    }
}
