//! Types for realtime voice sessions.

use serde::{Deserialize, Serialize};

/// Server-side voice activity detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    pub threshold: f32,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            kind: "server_vad".to_string(),
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 700,
        }
    }
}

/// Parameters for a new realtime session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub model: String,
    pub voice: String,
    pub instructions: String,
    pub modalities: Vec<String>,
    pub turn_detection: TurnDetection,
}

impl SessionConfig {
    /// Audio and text session with default turn detection.
    pub fn new(model: &str, voice: &str, instructions: &str) -> Self {
        Self {
            model: model.to_string(),
            voice: voice.to_string(),
            instructions: instructions.to_string(),
            modalities: vec!["audio".to_string(), "text".to_string()],
            turn_detection: TurnDetection::default(),
        }
    }
}

/// A created session with its short-lived credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub client_secret: String,
    /// Unix timestamp after which the client secret is rejected.
    pub expires_at: Option<i64>,
}
