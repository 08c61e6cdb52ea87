use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a meeting.
///
/// The set is closed. `Processing`, `Completed` and `Cancelled` never move back to an
/// earlier status; only the transition operations in the domain layer write this column.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "meeting_status")]
pub enum MeetingStatus {
    /// Scheduled but not yet started
    #[sea_orm(string_value = "upcoming")]
    #[default]
    Upcoming,
    /// The call is in progress
    #[sea_orm(string_value = "active")]
    Active,
    /// The call ended with a transcript that is being summarized
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl MeetingStatus {
    /// Statuses that no user-driven operation can move a meeting out of.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MeetingStatus::Processing | MeetingStatus::Completed | MeetingStatus::Cancelled
        )
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeetingStatus::Upcoming => write!(fmt, "upcoming"),
            MeetingStatus::Active => write!(fmt, "active"),
            MeetingStatus::Processing => write!(fmt, "processing"),
            MeetingStatus::Completed => write!(fmt, "completed"),
            MeetingStatus::Cancelled => write!(fmt, "cancelled"),
        }
    }
}

impl From<&str> for MeetingStatus {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "active" => MeetingStatus::Active,
            "processing" => MeetingStatus::Processing,
            "completed" => MeetingStatus::Completed,
            "cancelled" => MeetingStatus::Cancelled,
            _ => MeetingStatus::Upcoming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn only_processing_completed_and_cancelled_are_terminal() {
        assert!(!MeetingStatus::Upcoming.is_terminal());
        assert!(!MeetingStatus::Active.is_terminal());
        assert!(MeetingStatus::Processing.is_terminal());
        assert!(MeetingStatus::Completed.is_terminal());
        assert!(MeetingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn display_matches_database_string_values() {
        for status in MeetingStatus::iter() {
            assert_eq!(status.to_string(), status.to_value());
        }
    }
}
