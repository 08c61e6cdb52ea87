//! HTTP clients for the external platforms behind the `meeting-ai` provider traits.
//!
//! Each client owns an authenticated `meeting-auth` client with retry middleware and
//! maps vendor failures onto `meeting_ai::Error`.

use async_trait::async_trait;
use log::*;
use meeting_ai::traits::{call_platform, realtime, summarizer};
use meeting_ai::types::call::{CallInfo, CallRequest};
use meeting_ai::types::realtime::{Session, SessionConfig};
use meeting_ai::types::summary::Request;
use meeting_ai::Error as AiError;
use reqwest::StatusCode;
use std::time::Duration;

pub mod openai;
pub mod stream_video;

/// Maps a non-success response onto the provider-neutral error variants.
pub(crate) fn status_error(provider_id: &str, status: StatusCode, body: String) -> AiError {
    warn!("{provider_id} responded with {status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AiError::Authentication(format!("{provider_id}: {body}"))
        }
        StatusCode::NOT_FOUND => AiError::NotFound(format!("{provider_id}: {body}")),
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited {
            retry_after_seconds: 1,
        },
        _ => AiError::Provider(format!("{provider_id} returned {status}: {body}")),
    }
}

pub(crate) fn request_error(provider_id: &str, err: reqwest_middleware::Error) -> AiError {
    warn!("Request to {provider_id} failed: {err:?}");
    match &err {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => {
            AiError::Timeout(format!("{provider_id}: {err}"))
        }
        _ => AiError::Network(format!("{provider_id}: {err}")),
    }
}

/// Stands in for a provider whose credentials are not configured, so the server can
/// still start. Every operation fails with a configuration error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl Unconfigured {
    fn error(&self) -> AiError {
        AiError::Configuration("provider credentials are not configured".to_string())
    }
}

#[async_trait]
impl call_platform::Provider for Unconfigured {
    async fn get_or_create_call(&self, _request: CallRequest) -> Result<CallInfo, AiError> {
        Err(self.error())
    }

    async fn end_call(&self, _call_type: &str, _call_id: &str) -> Result<(), AiError> {
        Err(self.error())
    }

    async fn get_call(&self, _call_type: &str, _call_id: &str) -> Result<CallInfo, AiError> {
        Err(self.error())
    }

    async fn fetch_transcript(&self, _url: &str) -> Result<String, AiError> {
        Err(self.error())
    }

    fn create_user_token(&self, _user_id: &str, _ttl: Duration) -> Result<String, AiError> {
        Err(self.error())
    }

    fn api_key(&self) -> &str {
        ""
    }

    fn provider_id(&self) -> &str {
        "unconfigured"
    }
}

#[async_trait]
impl summarizer::Provider for Unconfigured {
    async fn summarize(&self, _request: Request) -> Result<String, AiError> {
        Err(self.error())
    }

    fn provider_id(&self) -> &str {
        "unconfigured"
    }
}

#[async_trait]
impl realtime::Provider for Unconfigured {
    async fn create_session(&self, _config: SessionConfig) -> Result<Session, AiError> {
        Err(self.error())
    }

    async fn exchange_sdp(
        &self,
        _client_secret: &str,
        _model: &str,
        _offer_sdp: &str,
    ) -> Result<String, AiError> {
        Err(self.error())
    }

    fn provider_id(&self) -> &str {
        "unconfigured"
    }
}
