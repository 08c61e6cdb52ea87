//! Transcript processing job.
//!
//! Turns the raw transcript of an ended call into resolved transcript entries and a
//! summary, then completes the meeting. Jobs arrive as
//! [`DomainEvent::MeetingProcessingRequested`] through a [`TranscriptJobQueue`] and are
//! run off the request path by [`spawn_worker`].
//!
//! A job is retried as a whole a bounded number of times. Step outputs are kept in a
//! [`Checkpoint`] so a retry resumes at the first step that has not produced a result.
//! A job that exhausts its attempts leaves the meeting in `processing`.

use crate::error::Error;
use crate::meeting::publish_status;
use crate::meeting_status::MeetingStatus;
use crate::transcript_entry::{TranscriptEntries, TranscriptEntry};
use crate::Id;
use async_trait::async_trait;
use entity_api::meeting::{self as store, Transition};
use events::{DomainEvent, EventHandler, EventPublisher, JobPayload};
use log::*;
use meeting_ai::traits::{call_platform, summarizer};
use meeting_ai::types::summary::Request;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::Value;
use service::config::Config;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Raw record type marking a finished speech turn.
const SPEECH_TURN: &str = "speech.user.stopped";

/// Summary stored when a call produced no speech, as opposed to `None` (not processed).
pub const EMPTY_TRANSCRIPT_SUMMARY: &str = "No transcript available.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert meeting summarizer. Given a transcript, produce a concise structured summary with these sections:

**Overview**
2-3 sentences on what the meeting was about.

**Key Topics**
- Bullet list of main discussion points

**Action Items**
- Any tasks, decisions, or next steps mentioned (write \"None identified\" if none)

**Sentiment**
Overall tone of the meeting (positive / neutral / mixed / negative)

Be factual, professional, and concise. Use the exact section headers above.";

#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Attempts after the first one
    pub retries: u32,
    /// Delay before retry `n` is `backoff * n`
    pub backoff: Duration,
    pub summary_timeout: Duration,
    pub summary_model: String,
}

impl JobSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retries: config.transcript_job_retries,
            backoff: Duration::from_millis(config.transcript_job_backoff_ms),
            summary_timeout: Duration::from_secs(config.summary_timeout_secs),
            summary_model: config.summary_model.clone(),
        }
    }
}

/// One finished speech turn as found in the raw transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRecord {
    pub speaker_id: Option<String>,
    pub user_id: Option<String>,
    pub text: String,
    pub start_time: String,
    pub stop_time: String,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    speaker_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    start_time: Value,
    #[serde(default)]
    stop_time: Value,
}

/// Timestamps arrive as strings or as numbers depending on the platform version.
fn time_field(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Parses newline-delimited JSON, keeping finished speech turns with text, in order.
/// Lines that are not valid JSON, or not speech turns, are skipped.
pub fn parse_transcript(raw: &str) -> Vec<SpeechRecord> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<RawRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                trace!("Skipping transcript line: {e}");
                None
            }
        })
        .filter(|record| record.kind == SPEECH_TURN)
        .filter_map(|record| {
            let text = record.text?.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(SpeechRecord {
                speaker_id: record.speaker_id.filter(|s| !s.is_empty()),
                user_id: record.user_id.filter(|s| !s.is_empty()),
                text,
                start_time: time_field(record.start_time),
                stop_time: time_field(record.stop_time),
            })
        })
        .collect()
}

/// Distinct user ids referenced by `records` that are valid record ids.
pub fn speaker_user_ids(records: &[SpeechRecord]) -> Vec<Id> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|record| record.user_id.as_deref())
        .filter_map(|user_id| entity_api::parse_id(user_id).ok())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Labels each record with the matching user name, falling back to the raw speaker id.
pub fn resolve_speakers(records: Vec<SpeechRecord>, names: &HashMap<Id, String>) -> Vec<TranscriptEntry> {
    records
        .into_iter()
        .map(|record| {
            let name = record
                .user_id
                .as_deref()
                .and_then(|user_id| entity_api::parse_id(user_id).ok())
                .and_then(|id| names.get(&id).cloned());
            let speaker = name
                .or(record.speaker_id)
                .unwrap_or_else(|| "Unknown".to_string());

            TranscriptEntry {
                speaker,
                text: record.text,
                start_time: record.start_time,
                stop_time: record.stop_time,
            }
        })
        .collect()
}

/// One `[speaker]: text` line per turn.
pub fn transcript_text(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("[{}]: {}", entry.speaker, entry.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Step outputs that survive between attempts of one job.
#[derive(Debug, Default)]
pub struct Checkpoint {
    /// The meeting was seen in `processing` when the job started
    pub confirmed: bool,
    pub raw: Option<String>,
    pub entries: Option<Vec<TranscriptEntry>>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// No speech in the transcript; completed with the placeholder summary
    CompletedEmpty,
    /// The meeting was no longer processing
    Skipped,
}

/// A processing request taken off the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub meeting_id: Id,
    pub transcript_url: String,
}

pub struct JobRunner {
    db: Arc<DatabaseConnection>,
    /// Must not contain the job queue itself
    events: EventPublisher,
    call_platform: Arc<dyn call_platform::Provider>,
    summarizer: Arc<dyn summarizer::Provider>,
    settings: JobSettings,
}

impl JobRunner {
    pub fn new(
        db: Arc<DatabaseConnection>,
        events: EventPublisher,
        call_platform: Arc<dyn call_platform::Provider>,
        summarizer: Arc<dyn summarizer::Provider>,
        settings: JobSettings,
    ) -> Self {
        Self {
            db,
            events,
            call_platform,
            summarizer,
            settings,
        }
    }

    pub async fn run(&self, job: Job) -> Result<Outcome, Error> {
        let Job {
            meeting_id,
            transcript_url,
        } = job;

        let attempts = 1 + self.settings.retries;
        let mut checkpoint = Checkpoint::default();

        for attempt in 1..=attempts {
            match self.attempt(meeting_id, &transcript_url, &mut checkpoint).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < attempts => {
                    warn!("Transcript job for meeting {meeting_id} failed on attempt {attempt}/{attempts}: {e}");
                    tokio::time::sleep(self.settings.backoff * attempt).await;
                }
                Err(e) => {
                    error!(
                        "Transcript job for meeting {meeting_id} failed permanently after {attempts} attempt(s), meeting stays processing: {e}"
                    );
                    return Err(e);
                }
            }
        }

        Err(Error::config("transcript job configured with zero attempts"))
    }

    async fn attempt(
        &self,
        meeting_id: Id,
        transcript_url: &str,
        checkpoint: &mut Checkpoint,
    ) -> Result<Outcome, Error> {
        if !checkpoint.confirmed {
            let meeting = store::find_by_id(self.db.as_ref(), meeting_id).await?;
            if meeting.status != MeetingStatus::Processing {
                info!("Skipping transcript job for meeting {meeting_id}: it is {}", meeting.status);
                return Ok(Outcome::Skipped);
            }
            checkpoint.confirmed = true;
        }

        let raw = match &checkpoint.raw {
            Some(raw) => raw.clone(),
            None => {
                debug!("Fetching transcript for meeting {meeting_id}");
                let raw = self.call_platform.fetch_transcript(transcript_url).await?;
                checkpoint.raw = Some(raw.clone());
                raw
            }
        };

        let entries = match &checkpoint.entries {
            Some(entries) => entries.clone(),
            None => {
                let records = parse_transcript(&raw);
                debug!("Meeting {meeting_id} transcript has {} speech turn(s)", records.len());
                if records.is_empty() {
                    return self.complete_empty(meeting_id).await;
                }

                let names =
                    entity_api::user::find_names_by_ids(self.db.as_ref(), speaker_user_ids(&records))
                        .await?;
                let entries = resolve_speakers(records, &names);
                checkpoint.entries = Some(entries.clone());
                entries
            }
        };

        let summary = match &checkpoint.summary {
            Some(summary) => summary.clone(),
            None => {
                let summary = self.summarize(&entries).await?;
                checkpoint.summary = Some(summary.clone());
                summary
            }
        };

        self.complete(
            meeting_id,
            Transition::to(MeetingStatus::Completed)
                .from(&[MeetingStatus::Processing])
                .summary(summary)
                .transcript_entries(TranscriptEntries::from(entries)),
            Outcome::Completed,
        )
        .await
    }

    async fn summarize(&self, entries: &[TranscriptEntry]) -> Result<String, Error> {
        let request = Request {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            prompt: format!(
                "Summarize this meeting transcript:\n\n{}",
                transcript_text(entries)
            ),
            model: self.settings.summary_model.clone(),
        };

        match tokio::time::timeout(self.settings.summary_timeout, self.summarizer.summarize(request))
            .await
        {
            Ok(summary) => Ok(summary?),
            Err(_) => Err(Error::timeout(format!(
                "{} did not return a summary within {:?}",
                self.summarizer.provider_id(),
                self.settings.summary_timeout
            ))),
        }
    }

    async fn complete_empty(&self, meeting_id: Id) -> Result<Outcome, Error> {
        info!("Meeting {meeting_id} transcript has no speech");
        self.complete(
            meeting_id,
            Transition::to(MeetingStatus::Completed)
                .from(&[MeetingStatus::Processing])
                .summary(EMPTY_TRANSCRIPT_SUMMARY.to_string())
                .transcript_entries(TranscriptEntries::default()),
            Outcome::CompletedEmpty,
        )
        .await
    }

    async fn complete(
        &self,
        meeting_id: Id,
        transition: Transition,
        outcome: Outcome,
    ) -> Result<Outcome, Error> {
        let rows = store::transition(self.db.as_ref(), meeting_id, transition).await?;
        if rows == 0 {
            info!("Meeting {meeting_id} left processing while its transcript job ran");
            return Ok(Outcome::Skipped);
        }

        let meeting = store::find_by_id(self.db.as_ref(), meeting_id).await?;
        info!("Meeting {meeting_id} completed");
        publish_status(&self.events, &meeting).await;
        Ok(outcome)
    }
}

/// Forwards processing requests to the worker channel. Publishing never waits for the
/// job to run.
pub struct TranscriptJobQueue {
    sender: UnboundedSender<Job>,
}

impl TranscriptJobQueue {
    pub fn channel() -> (Self, UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventHandler for TranscriptJobQueue {
    async fn handle(&self, event: &DomainEvent) {
        let DomainEvent::MeetingProcessingRequested {
            meeting_id,
            transcript_url,
        } = event
        else {
            return;
        };

        if let Ok(payload) =
            serde_json::to_string(&JobPayload::processing(*meeting_id, transcript_url.clone()))
        {
            debug!("Enqueueing job {payload}");
        }

        let job = Job {
            meeting_id: *meeting_id,
            transcript_url: transcript_url.clone(),
        };
        if self.sender.send(job).is_err() {
            error!("Transcript job worker is gone, meeting {meeting_id} will stay processing");
        }
    }
}

/// Drains the queue, running every job as its own task.
pub fn spawn_worker(mut receiver: UnboundedReceiver<Job>, runner: Arc<JobRunner>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Transcript job worker started");
        while let Some(job) = receiver.recv().await {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move {
                let meeting_id = job.meeting_id;
                match runner.run(job).await {
                    Ok(outcome) => debug!("Transcript job for meeting {meeting_id}: {outcome:?}"),
                    Err(e) => debug!("Transcript job for meeting {meeting_id} gave up: {e}"),
                }
            });
        }
        info!("Transcript job worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = r#"{"type":"call.session_started"}
{"type":"speech.user.stopped","speaker_id":"spk-1","user_id":"u-1","text":" Hello there ","start_time":"2026-03-01T10:00:00Z","stop_time":"2026-03-01T10:00:02Z"}
not json at all
{"type":"speech.user.stopped","speaker_id":"spk-2","text":"   ","start_time":1,"stop_time":2}

{"type":"speech.user.stopped","speaker_id":"spk-2","text":"Second turn","start_time":1500,"stop_time":2500}
{"type":"speech.user.started","speaker_id":"spk-2","text":"ignored"}"#;

    #[test]
    fn parse_keeps_only_finished_turns_with_text_in_order() {
        let records = parse_transcript(MIXED);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "Hello there");
        assert_eq!(records[0].start_time, "2026-03-01T10:00:00Z");
        assert_eq!(records[1].text, "Second turn");
        assert_eq!(records[1].start_time, "1500");
        assert_eq!(records[1].user_id, None);
    }

    #[test]
    fn parse_of_garbage_is_empty() {
        assert!(parse_transcript("").is_empty());
        assert!(parse_transcript("{\n}\n[1,2]").is_empty());
    }

    #[test]
    fn unresolved_speakers_fall_back_to_the_raw_identifier() {
        let ana = Id::new_v4();
        let stranger = Id::new_v4();
        let records = vec![
            SpeechRecord {
                speaker_id: Some("spk-1".to_string()),
                user_id: Some(ana.to_string()),
                text: "hi".to_string(),
                start_time: String::new(),
                stop_time: String::new(),
            },
            SpeechRecord {
                speaker_id: Some("spk-2".to_string()),
                user_id: Some(stranger.to_string()),
                text: "hello".to_string(),
                start_time: String::new(),
                stop_time: String::new(),
            },
            SpeechRecord {
                speaker_id: None,
                user_id: None,
                text: "who am I".to_string(),
                start_time: String::new(),
                stop_time: String::new(),
            },
        ];
        let names = HashMap::from([(ana, "Ana".to_string())]);

        let entries = resolve_speakers(records, &names);

        let speakers: Vec<_> = entries.iter().map(|e| e.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["Ana", "spk-2", "Unknown"]);
        assert_eq!(
            transcript_text(&entries),
            "[Ana]: hi\n[spk-2]: hello\n[Unknown]: who am I"
        );
    }

    #[test]
    fn speaker_user_ids_are_distinct_and_valid() {
        let id = Id::new_v4();
        let record = |user_id: &str| SpeechRecord {
            speaker_id: None,
            user_id: Some(user_id.to_string()),
            text: "x".to_string(),
            start_time: String::new(),
            stop_time: String::new(),
        };

        let ids = speaker_user_ids(&[record(&id.to_string()), record("guest"), record(&id.to_string())]);

        assert_eq!(ids, vec![id]);
    }

    #[tokio::test]
    async fn queue_forwards_only_processing_requests() {
        let (queue, mut receiver) = TranscriptJobQueue::channel();
        let meeting_id = Id::new_v4();

        queue
            .handle(&DomainEvent::MeetingStatusChanged {
                meeting_id,
                status: "processing".to_string(),
                notify_user_ids: vec![],
            })
            .await;
        queue
            .handle(&DomainEvent::MeetingProcessingRequested {
                meeting_id,
                transcript_url: "https://cdn/t.jsonl".to_string(),
            })
            .await;

        assert_eq!(
            receiver.try_recv().ok(),
            Some(Job {
                meeting_id,
                transcript_url: "https://cdn/t.jsonl".to_string()
            })
        );
        assert!(receiver.try_recv().is_err());
    }
}
