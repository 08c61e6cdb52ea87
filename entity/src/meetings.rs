//! SeaORM Entity for the meetings table.
//! A meeting is bound to one agent and moves through the `MeetingStatus` lifecycle.

use crate::meeting_status::MeetingStatus;
use crate::transcript_entry::TranscriptEntries;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::meetings::Model)]
#[sea_orm(schema_name = "meetings_platform", table_name = "meetings")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    #[serde(skip_deserializing)]
    pub user_id: Id,

    /// Set at creation and never changed afterwards
    #[schema(value_type = Uuid)]
    pub agent_id: Id,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[serde(skip_deserializing)]
    pub status: MeetingStatus,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub scheduled_at: Option<DateTimeWithTimeZone>,

    /// Set by the transition into `active`
    #[serde(skip_deserializing)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub started_at: Option<DateTimeWithTimeZone>,

    /// Set by the transition out of `active`, or by cancelling a started meeting
    #[serde(skip_deserializing)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub ended_at: Option<DateTimeWithTimeZone>,

    /// Location of the raw call transcript on the video platform
    #[serde(skip_deserializing)]
    pub transcript_url: Option<String>,

    /// Generated summary; `None` means not processed yet
    #[serde(skip_deserializing)]
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    /// Notes entered by the owner when ending the meeting
    #[serde(skip_deserializing)]
    #[sea_orm(column_type = "Text", nullable)]
    pub user_notes: Option<String>,

    /// Speaker-resolved transcript written by the processing job
    #[serde(skip_deserializing)]
    #[sea_orm(column_type = "JsonBinary", nullable)]
    #[schema(value_type = Option<Vec<crate::transcript_entry::TranscriptEntry>>)]
    pub transcript_entries: Option<TranscriptEntries>,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,

    #[sea_orm(
        belongs_to = "super::agents::Entity",
        from = "Column::AgentId",
        to = "super::agents::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Agents,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::agents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
