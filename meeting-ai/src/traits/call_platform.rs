//! Call platform provider trait.

use crate::types::call::{CallInfo, CallRequest};
use crate::Error;
use async_trait::async_trait;
use std::time::Duration;

/// Abstraction for the video-calling service that hosts meetings.
///
/// The platform owns the call object and the closed-caption transcript it
/// produces; the meeting record in our store stays the source of truth for
/// lifecycle state.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Create the call if it does not exist, otherwise return the existing one.
    async fn get_or_create_call(&self, request: CallRequest) -> Result<CallInfo, Error>;

    /// Mark the call as ended for every participant.
    async fn end_call(&self, call_type: &str, call_id: &str) -> Result<(), Error>;

    /// Fetch the current call state, including any transcript files.
    async fn get_call(&self, call_type: &str, call_id: &str) -> Result<CallInfo, Error>;

    /// Download a transcript file. Transcript URLs are pre-signed, so no
    /// platform credentials are attached.
    async fn fetch_transcript(&self, url: &str) -> Result<String, Error>;

    /// Issue a client token that lets `user_id` join calls for `ttl`.
    fn create_user_token(&self, user_id: &str, ttl: Duration) -> Result<String, Error>;

    /// Public API key handed to browser clients alongside a user token.
    fn api_key(&self) -> &str;

    /// Lowercase identifier used in logs (e.g. "stream_video").
    fn provider_id(&self) -> &str;
}
