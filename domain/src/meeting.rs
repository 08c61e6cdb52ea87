//! Meeting lifecycle service.
//!
//! A meeting moves `upcoming -> active -> processing -> completed`, or to `cancelled`
//! from `upcoming`/`active`. The functions in this module are the only writers of
//! `status`, `started_at` and `ended_at`. Each transition is a conditional update
//! against the persisted status, so a duplicate or late request becomes a no-op
//! instead of clobbering a more advanced state.
//!
//! Call-platform side effects (registering and ending the video call) are best effort:
//! a platform failure is logged and never blocks the local transition.

use crate::caller::AuthenticatedCaller;
use crate::error::Error;
use crate::meeting_status::MeetingStatus;
use crate::meetings::Model;
use crate::transcript_entry::TranscriptEntry;
use crate::{agent, Id};
use chrono::{DateTime, FixedOffset, Utc};
use entity_api::meeting::{self as store, Transition};
use entity_api::mutate::UpdateMap;
use events::{DomainEvent, EventPublisher};
use log::*;
use meeting_ai::traits::call_platform;
use meeting_ai::types::call::{CallRequest, DEFAULT_CALL_TYPE};
use sea_orm::{DatabaseConnection, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 100;

/// Fields accepted when scheduling a new meeting.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMeeting {
    pub name: String,
    #[schema(value_type = Uuid)]
    pub agent_id: Id,
    pub description: Option<String>,
    /// RFC 3339 timestamp. Anything unparseable is stored as no schedule.
    pub scheduled_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub status: Option<MeetingStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Optional details supplied when ending a meeting.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndParams {
    pub notes: Option<String>,
    pub transcript_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MeetingStats {
    pub total: i64,
    pub upcoming: i64,
    pub active: i64,
    pub processing: i64,
    pub completed: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    /// Entries were persisted by the transcript job
    Stored,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Transcript {
    pub entries: Vec<TranscriptEntry>,
    pub source: TranscriptSource,
}

/// Parses a schedule timestamp permissively: RFC 3339 or nothing.
pub fn parse_scheduled_at(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(at) => Some(at),
        Err(e) => {
            debug!("Ignoring unparseable scheduled_at {value:?}: {e}");
            None
        }
    }
}

/// Builds the update map for editable meeting details. A schedule that is present but
/// unparseable clears the stored schedule.
pub fn details_update_map(
    name: Option<String>,
    description: Option<String>,
    scheduled_at: Option<String>,
) -> UpdateMap {
    let mut update_map = UpdateMap::new();
    update_map.insert("name".to_string(), name.map(Value::from));
    update_map.insert("description".to_string(), description.map(Value::from));
    update_map.insert(
        "scheduled_at".to_string(),
        scheduled_at.map(|raw| Value::ChronoDateTimeWithTimeZone(
            parse_scheduled_at(Some(&raw)).map(Box::new),
        )),
    );
    update_map
}

pub async fn create(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    params: NewMeeting,
) -> Result<Model, Error> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(Error::invalid("Meeting name is required"));
    }

    // Surfaces a missing or foreign agent as not found
    let agent = agent::find_by_id(db, caller, params.agent_id).await?;

    let description = params
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let now = Utc::now();
    let meeting = store::create(
        db,
        Model {
            id: Id::new_v4(),
            user_id: caller.user_id(),
            agent_id: agent.id,
            name: name.to_string(),
            description,
            status: MeetingStatus::Upcoming,
            scheduled_at: parse_scheduled_at(params.scheduled_at.as_deref()),
            started_at: None,
            ended_at: None,
            transcript_url: None,
            summary: None,
            user_notes: None,
            transcript_entries: None,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    info!("Meeting {} created with agent {}", meeting.id, agent.id);
    Ok(meeting)
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    id: Id,
) -> Result<Model, Error> {
    Ok(store::find_by_id_and_user(db, id, caller.user_id()).await?)
}

pub async fn list(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    params: ListParams,
) -> Result<Vec<Model>, Error> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let offset = params.offset.unwrap_or(0);

    Ok(store::find_by_user(db, caller.user_id(), params.status, limit, offset).await?)
}

pub async fn get_stats(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
) -> Result<MeetingStats, Error> {
    let counts = store::count_by_status(db, caller.user_id()).await?;

    let mut stats = MeetingStats::default();
    for entry in counts {
        stats.total += entry.count;
        match entry.status {
            MeetingStatus::Upcoming => stats.upcoming = entry.count,
            MeetingStatus::Active => stats.active = entry.count,
            MeetingStatus::Processing => stats.processing = entry.count,
            MeetingStatus::Completed => stats.completed = entry.count,
            MeetingStatus::Cancelled => stats.cancelled = entry.count,
        }
    }

    Ok(stats)
}

/// Edits name, description or schedule of a meeting that has not started yet.
/// Status and lifecycle timestamps are not reachable through this path.
pub async fn update(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    id: Id,
    update_map: UpdateMap,
) -> Result<Model, Error> {
    if let Some(Value::String(Some(name))) = update_map.get("name") {
        if name.trim().is_empty() {
            return Err(Error::invalid("Meeting name cannot be empty"));
        }
    }

    let meeting = find_by_id(db, caller, id).await?;
    if update_map.is_empty() {
        return Ok(meeting);
    }
    if meeting.status != MeetingStatus::Upcoming {
        return Err(Error::conflict(format!(
            "Meeting {id} is {} and can no longer be edited",
            meeting.status
        )));
    }

    Ok(store::update_details(db, id, caller.user_id(), update_map).await?)
}

/// Deletes a meeting. The agent it was bound to is left untouched.
pub async fn delete(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    id: Id,
) -> Result<(), Error> {
    store::delete(db, id, caller.user_id()).await?;
    info!("Meeting {id} deleted");
    Ok(())
}

pub async fn get_transcript(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    id: Id,
) -> Result<Transcript, Error> {
    let meeting = find_by_id(db, caller, id).await?;

    Ok(match meeting.transcript_entries {
        Some(entries) if !entries.is_empty() => Transcript {
            entries: entries.into_inner(),
            source: TranscriptSource::Stored,
        },
        _ => Transcript {
            entries: Vec::new(),
            source: TranscriptSource::None,
        },
    })
}

/// `upcoming -> active`. Starting an already active meeting returns it unchanged.
pub async fn start(
    db: &DatabaseConnection,
    events: &EventPublisher,
    call_platform: &dyn call_platform::Provider,
    caller: AuthenticatedCaller,
    id: Id,
) -> Result<Model, Error> {
    let meeting = find_by_id(db, caller, id).await?;
    match meeting.status {
        MeetingStatus::Active => return Ok(meeting),
        MeetingStatus::Upcoming => {}
        status => return Err(Error::conflict(format!("Cannot start a {status} meeting"))),
    }

    register_call(db, call_platform, &meeting).await;

    let rows = store::transition(
        db,
        id,
        Transition::to(MeetingStatus::Active)
            .from(&[MeetingStatus::Upcoming])
            .owned_by(caller.user_id())
            .started_at(Utc::now()),
    )
    .await?;

    settle(db, events, id, rows == 1, |m| m.status == MeetingStatus::Active).await
}

/// `active -> processing` when a transcript is available, otherwise `active -> completed`.
///
/// Ending a meeting that has already left `active` through an end returns it unchanged
/// and does not enqueue another transcript job.
pub async fn end(
    db: &DatabaseConnection,
    events: &EventPublisher,
    call_platform: &dyn call_platform::Provider,
    caller: AuthenticatedCaller,
    id: Id,
    params: EndParams,
) -> Result<Model, Error> {
    let meeting = find_by_id(db, caller, id).await?;
    if already_ended(&meeting) {
        return Ok(meeting);
    }
    if meeting.status != MeetingStatus::Active {
        return Err(Error::conflict(format!(
            "Cannot end a {} meeting",
            meeting.status
        )));
    }

    end_call(call_platform, id).await;

    let transcript_url = match non_empty(params.transcript_url) {
        Some(url) => Some(url),
        None => lookup_transcript_url(call_platform, id).await,
    };
    let target = if transcript_url.is_some() {
        MeetingStatus::Processing
    } else {
        MeetingStatus::Completed
    };

    let rows = store::transition(
        db,
        id,
        Transition::to(target)
            .from(&[MeetingStatus::Active])
            .owned_by(caller.user_id())
            .ended_at(Utc::now())
            .user_notes(non_empty(params.notes))
            .transcript_url(transcript_url.clone()),
    )
    .await?;

    if rows == 1 {
        if let Some(transcript_url) = transcript_url {
            request_processing(events, id, transcript_url).await;
        }
    }

    settle(db, events, id, rows == 1, already_ended).await
}

/// `upcoming | active -> cancelled`. Cancelling a cancelled meeting returns it unchanged.
pub async fn cancel(
    db: &DatabaseConnection,
    events: &EventPublisher,
    call_platform: &dyn call_platform::Provider,
    caller: AuthenticatedCaller,
    id: Id,
) -> Result<Model, Error> {
    let meeting = find_by_id(db, caller, id).await?;
    match meeting.status {
        MeetingStatus::Cancelled => return Ok(meeting),
        MeetingStatus::Upcoming | MeetingStatus::Active => {}
        status => return Err(Error::conflict(format!("Cannot cancel a {status} meeting"))),
    }

    // A started meeting also records when it stopped
    let mut rows = store::transition(
        db,
        id,
        Transition::to(MeetingStatus::Cancelled)
            .from(&[MeetingStatus::Active])
            .owned_by(caller.user_id())
            .ended_at(Utc::now()),
    )
    .await?;
    let was_active = rows == 1;

    if rows == 0 {
        rows = store::transition(
            db,
            id,
            Transition::to(MeetingStatus::Cancelled)
                .from(&[MeetingStatus::Upcoming])
                .owned_by(caller.user_id()),
        )
        .await?;
    }

    if was_active {
        end_call(call_platform, id).await;
    }

    settle(db, events, id, rows == 1, |m| {
        m.status == MeetingStatus::Cancelled
    })
    .await
}

/// True once a meeting has left `active` through an end rather than a cancel.
fn already_ended(meeting: &Model) -> bool {
    matches!(
        meeting.status,
        MeetingStatus::Processing | MeetingStatus::Completed
    ) && meeting.ended_at.is_some()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Re-reads a meeting after a conditional transition.
///
/// When this call applied the change, connected clients are notified. When it did not,
/// a concurrent request got there first: the result is accepted if it already matches
/// what was asked for, otherwise the caller gets a conflict.
async fn settle(
    db: &DatabaseConnection,
    events: &EventPublisher,
    id: Id,
    applied: bool,
    satisfied: impl Fn(&Model) -> bool,
) -> Result<Model, Error> {
    let meeting = store::find_by_id(db, id).await?;

    if applied {
        info!("Meeting {id} is now {}", meeting.status);
        publish_status(events, &meeting).await;
        return Ok(meeting);
    }

    if satisfied(&meeting) {
        debug!("Meeting {id} was already {}", meeting.status);
        Ok(meeting)
    } else {
        Err(Error::conflict(format!(
            "Meeting {id} changed concurrently and is now {}",
            meeting.status
        )))
    }
}

pub(crate) async fn publish_status(events: &EventPublisher, meeting: &Model) {
    events
        .publish(DomainEvent::MeetingStatusChanged {
            meeting_id: meeting.id,
            status: meeting.status.to_string(),
            notify_user_ids: vec![meeting.user_id],
        })
        .await;
}

pub(crate) async fn request_processing(events: &EventPublisher, id: Id, transcript_url: String) {
    info!("Enqueueing transcript processing for meeting {id}");
    events
        .publish(DomainEvent::MeetingProcessingRequested {
            meeting_id: id,
            transcript_url,
        })
        .await;
}

async fn register_call(
    db: &DatabaseConnection,
    call_platform: &dyn call_platform::Provider,
    meeting: &Model,
) {
    let agent = match entity_api::agent::find_by_id(db, meeting.agent_id).await {
        Ok(agent) => agent,
        Err(e) => {
            warn!("Could not load agent {} for meeting {}: {e}", meeting.agent_id, meeting.id);
            return;
        }
    };

    let request = CallRequest {
        call_type: DEFAULT_CALL_TYPE.to_string(),
        call_id: meeting.id.to_string(),
        created_by_id: meeting.user_id.to_string(),
        custom: json!({
            "meetingId": meeting.id,
            "agentId": agent.id,
            "agentName": agent.name,
            "instructions": agent.instructions,
        }),
    };

    if let Err(e) = call_platform.get_or_create_call(request).await {
        warn!(
            "Failed to register call for meeting {} with {}: {e}",
            meeting.id,
            call_platform.provider_id()
        );
    }
}

pub(crate) async fn end_call(call_platform: &dyn call_platform::Provider, id: Id) {
    if let Err(e) = call_platform
        .end_call(DEFAULT_CALL_TYPE, &id.to_string())
        .await
    {
        warn!(
            "Failed to end call for meeting {id} with {}: {e}",
            call_platform.provider_id()
        );
    }
}

async fn lookup_transcript_url(
    call_platform: &dyn call_platform::Provider,
    id: Id,
) -> Option<String> {
    match call_platform
        .get_call(DEFAULT_CALL_TYPE, &id.to_string())
        .await
    {
        Ok(call) => call.transcript_url().map(str::to_string),
        Err(e) => {
            warn!("Failed to look up transcript for meeting {id}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scheduled_at_accepts_rfc3339() {
        let parsed = parse_scheduled_at(Some("2026-03-01T10:00:00Z")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T10:00:00+00:00");
    }

    #[test]
    fn parse_scheduled_at_normalizes_garbage_to_none() {
        assert_eq!(parse_scheduled_at(Some("next tuesday")), None);
        assert_eq!(parse_scheduled_at(Some("   ")), None);
        assert_eq!(parse_scheduled_at(None), None);
    }

    #[test]
    fn details_update_map_clears_an_unparseable_schedule() {
        let update_map = details_update_map(None, None, Some("soon".to_string()));

        assert_eq!(
            update_map.get("scheduled_at"),
            Some(&Value::ChronoDateTimeWithTimeZone(None))
        );
        assert!(update_map.get("name").is_none());
    }
}
