//! Types for summarization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Instruction that fixes the output format.
    pub system: String,
    pub prompt: String,
    pub model: String,
}
