//! Store operations for the meetings table.
//!
//! Status changes go exclusively through [`transition`], a conditional update that only
//! applies when the persisted status is one of an expected set. Callers learn whether the
//! change happened from the number of affected rows, which makes duplicate or reordered
//! requests fail safe instead of overwriting a more advanced state.

use super::error::{EntityApiErrorKind, Error};
use crate::mutate::{self, UpdateMap};
use chrono::{DateTime, Utc};
use entity::meeting_status::MeetingStatus;
use entity::meetings::{ActiveModel, Column, Entity, Model};
use entity::transcript_entry::TranscriptEntries;
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, Condition, ConnectionTrait, FromQueryResult,
    QueryOrder, QuerySelect,
};
use serde::Serialize;

/// Columns a meeting owner may edit directly. Everything else is lifecycle-owned.
pub const EDITABLE_COLUMNS: [Column; 3] = [Column::Name, Column::Description, Column::ScheduledAt];

pub async fn create(db: &impl ConnectionTrait, meeting_model: Model) -> Result<Model, Error> {
    debug!("New Meeting Model to be inserted: {meeting_model:?}");

    let now = Utc::now();
    let meeting_active_model: ActiveModel = ActiveModel {
        user_id: Set(meeting_model.user_id),
        agent_id: Set(meeting_model.agent_id),
        name: Set(meeting_model.name),
        description: Set(meeting_model.description),
        status: Set(MeetingStatus::Upcoming),
        scheduled_at: Set(meeting_model.scheduled_at),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(meeting_active_model.insert(db).await?)
}

/// Finds a meeting regardless of owner. Only for system callers such as webhooks and jobs.
pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Finds a meeting owned by `user_id`. A meeting owned by someone else is reported as
/// not found.
pub async fn find_by_id_and_user(
    db: &impl ConnectionTrait,
    id: Id,
    user_id: Id,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            debug!("Meeting {id} not found for user {user_id}");
            Error::not_found()
        })
}

pub async fn find_by_user(
    db: &impl ConnectionTrait,
    user_id: Id,
    status: Option<MeetingStatus>,
    limit: u64,
    offset: u64,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find().filter(Column::UserId.eq(user_id));

    if let Some(status) = status {
        query = query.filter(Column::Status.eq(status));
    }

    Ok(query
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?)
}

pub async fn count_by_agent(db: &impl ConnectionTrait, agent_id: Id) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::AgentId.eq(agent_id))
        .count(db)
        .await?)
}

/// Number of meetings a user has in one status.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct StatusCount {
    pub status: MeetingStatus,
    pub count: i64,
}

pub async fn count_by_status(
    db: &impl ConnectionTrait,
    user_id: Id,
) -> Result<Vec<StatusCount>, Error> {
    Ok(Entity::find()
        .select_only()
        .column(Column::Status)
        .column_as(Column::Id.count(), "count")
        .filter(Column::UserId.eq(user_id))
        .group_by(Column::Status)
        .into_model::<StatusCount>()
        .all(db)
        .await?)
}

/// Applies `update_map` to the editable columns of a meeting that is still `upcoming`.
///
/// Returns `RecordNotUpdated` when the meeting exists but has already started.
pub async fn update_details(
    db: &impl ConnectionTrait,
    id: Id,
    user_id: Id,
    update_map: UpdateMap,
) -> Result<Model, Error> {
    let mut active_model = ActiveModel {
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    mutate::apply(&mut active_model, &update_map, &EDITABLE_COLUMNS);

    let result = Entity::update_many()
        .set(active_model)
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Status.eq(MeetingStatus::Upcoming))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("Meeting {id} details not updated, it is no longer upcoming");
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotUpdated,
        });
    }

    find_by_id(db, id).await
}

pub async fn delete(db: &impl ConnectionTrait, id: Id, user_id: Id) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }

    Ok(())
}

/// A conditional status change for one meeting.
///
/// Built with [`Transition::to`] and applied with [`transition`]. Only the fields that were
/// explicitly provided are written, `updated_at` is always refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    to: MeetingStatus,
    from: Vec<MeetingStatus>,
    owner: Option<Id>,
    require_no_summary: bool,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    user_notes: Option<String>,
    transcript_url: Option<String>,
    summary: Option<String>,
    transcript_entries: Option<TranscriptEntries>,
}

impl Transition {
    pub fn to(status: MeetingStatus) -> Self {
        Self {
            to: status,
            from: Vec::new(),
            owner: None,
            require_no_summary: false,
            started_at: None,
            ended_at: None,
            user_notes: None,
            transcript_url: None,
            summary: None,
            transcript_entries: None,
        }
    }

    /// Statuses the meeting must currently be in for the change to apply.
    pub fn from(mut self, statuses: &[MeetingStatus]) -> Self {
        self.from = statuses.to_vec();
        self
    }

    pub fn owned_by(mut self, user_id: Id) -> Self {
        self.owner = Some(user_id);
        self
    }

    /// Only apply while no summary has been written.
    pub fn without_summary(mut self) -> Self {
        self.require_no_summary = true;
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn ended_at(mut self, at: DateTime<Utc>) -> Self {
        self.ended_at = Some(at);
        self
    }

    pub fn user_notes(mut self, notes: Option<String>) -> Self {
        self.user_notes = notes;
        self
    }

    pub fn transcript_url(mut self, url: Option<String>) -> Self {
        self.transcript_url = url;
        self
    }

    pub fn summary(mut self, summary: String) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn transcript_entries(mut self, entries: TranscriptEntries) -> Self {
        self.transcript_entries = Some(entries);
        self
    }

    pub fn target(&self) -> MeetingStatus {
        self.to
    }

    fn into_active_model(self) -> ActiveModel {
        let mut active_model = ActiveModel {
            status: Set(self.to),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        if let Some(at) = self.started_at {
            active_model.started_at = Set(Some(at.into()));
        }
        if let Some(at) = self.ended_at {
            active_model.ended_at = Set(Some(at.into()));
        }
        if let Some(notes) = self.user_notes {
            active_model.user_notes = Set(Some(notes));
        }
        if let Some(url) = self.transcript_url {
            active_model.transcript_url = Set(Some(url));
        }
        if let Some(summary) = self.summary {
            active_model.summary = Set(Some(summary));
        }
        if let Some(entries) = self.transcript_entries {
            active_model.transcript_entries = Set(Some(entries));
        }

        active_model
    }
}

/// Applies `transition` to meeting `id` if, and only if, its guards hold.
///
/// Returns the number of rows changed: `1` when applied, `0` when the meeting was missing,
/// owned by someone else, or not in one of the expected statuses.
pub async fn transition(
    db: &impl ConnectionTrait,
    id: Id,
    transition: Transition,
) -> Result<u64, Error> {
    debug!("Meeting {id} transition requested: {transition:?}");

    if transition.from.is_empty() {
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::ValidationError,
        });
    }

    let mut condition = Condition::all()
        .add(Column::Id.eq(id))
        .add(Column::Status.is_in(transition.from.clone()));
    if let Some(owner) = transition.owner {
        condition = condition.add(Column::UserId.eq(owner));
    }
    if transition.require_no_summary {
        condition = condition.add(Column::Summary.is_null());
    }

    let result = Entity::update_many()
        .set(transition.into_active_model())
        .filter(condition)
        .exec(db)
        .await?;

    debug!("Meeting {id} transition affected {} row(s)", result.rows_affected);

    Ok(result.rows_affected)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    fn meeting_model(status: MeetingStatus) -> Model {
        let now = Utc::now();
        Model {
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

    #[tokio::test]
    async fn create_returns_a_new_upcoming_meeting() -> Result<(), Error> {
        let meeting = meeting_model(MeetingStatus::Upcoming);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[meeting.clone()]])
            .into_connection();

        let created = create(&db, meeting.clone()).await?;

        assert_eq!(created.id, meeting.id);
        assert_eq!(created.status, MeetingStatus::Upcoming);
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_and_user_returns_not_found_for_missing_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = find_by_id_and_user(&db, Id::new_v4(), Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn transition_reports_applied_rows() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let rows = transition(
            &db,
            Id::new_v4(),
            Transition::to(MeetingStatus::Active)
                .from(&[MeetingStatus::Upcoming])
                .started_at(Utc::now()),
        )
        .await?;

        assert_eq!(rows, 1);
        Ok(())
    }

    #[tokio::test]
    async fn transition_reports_zero_rows_when_guard_fails() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let rows = transition(
            &db,
            Id::new_v4(),
            Transition::to(MeetingStatus::Active).from(&[MeetingStatus::Upcoming]),
        )
        .await?;

        assert_eq!(rows, 0);
        Ok(())
    }

    #[tokio::test]
    async fn transition_without_source_statuses_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = transition(&db, Id::new_v4(), Transition::to(MeetingStatus::Active)).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::ValidationError
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn update_details_fails_once_the_meeting_has_started() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let mut update_map = UpdateMap::new();
        update_map.insert("name".to_string(), Some("New name".into()));

        let result = update_details(&db, Id::new_v4(), Id::new_v4(), update_map).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotUpdated
        );
    }

    #[tokio::test]
    async fn delete_is_scoped_to_the_owner() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let meeting_id = Id::new_v4();
        let user_id = Id::new_v4();
        delete(&db, meeting_id, user_id).await?;

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"DELETE FROM "meetings_platform"."meetings" WHERE "meetings"."id" = $1 AND "meetings"."user_id" = $2"#,
                [meeting_id.into(), user_id.into()]
            )]
        );

        Ok(())
    }
}
