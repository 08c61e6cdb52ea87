//! Provider abstractions for the external platforms a meeting talks to.
//!
//! - A call platform that hosts the video call and produces the transcript
//! - A summarizer that turns a flattened transcript into a structured summary
//! - A realtime voice provider that issues short-lived agent sessions
//!
//! Domain code depends only on these traits, so tests substitute fakes and
//! deployments can swap vendors without touching lifecycle logic.

pub mod error;
pub mod traits;
pub mod types;

pub use error::Error;
