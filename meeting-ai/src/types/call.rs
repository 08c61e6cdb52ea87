//! Types for call platform operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Call type used for every meeting call.
pub const DEFAULT_CALL_TYPE: &str = "default";

/// Request to get or create a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRequest {
    pub call_type: String,
    pub call_id: String,
    /// User recorded as the call creator.
    pub created_by_id: String,
    /// Arbitrary metadata stored on the call (meeting and agent details).
    pub custom: Value,
}

/// A transcript file produced by the platform once captions are closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFile {
    pub url: String,
    pub filename: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Provider-neutral view of a call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallInfo {
    /// Composite identifier, `"<call_type>:<call_id>"`.
    pub cid: String,
    pub created_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub transcript_files: Vec<TranscriptFile>,
}

impl CallInfo {
    /// URL of the first available transcript file.
    pub fn transcript_url(&self) -> Option<&str> {
        self.transcript_files.first().map(|file| file.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_url_uses_first_file() {
        let info = CallInfo {
            cid: "default:abc".to_string(),
            transcript_files: vec![
                TranscriptFile {
                    url: "https://first".to_string(),
                    filename: None,
                    start_time: None,
                    end_time: None,
                },
                TranscriptFile {
                    url: "https://second".to_string(),
                    filename: None,
                    start_time: None,
                    end_time: None,
                },
            ],
            ..Default::default()
        };

        assert_eq!(info.transcript_url(), Some("https://first"));
        assert_eq!(CallInfo::default().transcript_url(), None);
    }
}
