use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One resolved speech turn from a call transcript.
/// Note: This struct does not have a corresponding table, it is stored as JSON on `meetings`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::transcript_entry::TranscriptEntry)]
pub struct TranscriptEntry {
    /// Display name of the speaker, or the raw platform speaker id when no user matched
    pub speaker: String,
    pub text: String,
    pub start_time: String,
    pub stop_time: String,
}

/// Ordered transcript entries persisted in the `meetings.transcript_entries` column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct TranscriptEntries(pub Vec<TranscriptEntry>);

impl TranscriptEntries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<TranscriptEntry> {
        self.0
    }
}

impl From<Vec<TranscriptEntry>> for TranscriptEntries {
    fn from(entries: Vec<TranscriptEntry>) -> Self {
        Self(entries)
    }
}
