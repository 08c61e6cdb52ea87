//! Stream Video client.
//!
//! Server-side requests authenticate with an HS256 JWT signed by the API secret and carry
//! the public API key as a query parameter. Browser clients get their own per-user token
//! from [`StreamVideoClient::create_user_token`].

use super::{request_error, status_error};
use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::*;
use meeting_ai::traits::call_platform::Provider;
use meeting_ai::types::call::{CallInfo, CallRequest, TranscriptFile};
use meeting_ai::Error as AiError;
use meeting_auth::api_key::{ApiKeyAuth, ApiKeyProvider};
use meeting_auth::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const PROVIDER_ID: &str = "stream_video";

/// Upper bound for downloading a transcript file, body included.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ServerClaims {
    server: bool,
}

#[derive(Debug, Serialize)]
struct UserClaims<'a> {
    user_id: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    call: CallPayload,
}

#[derive(Debug, Deserialize)]
struct CallPayload {
    cid: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    transcription: Option<TranscriptionPayload>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionPayload {
    #[serde(default)]
    closed_captions_files: Vec<TranscriptFile>,
}

impl From<CallPayload> for CallInfo {
    fn from(call: CallPayload) -> Self {
        CallInfo {
            cid: call.cid,
            created_at: call.created_at,
            ended_at: call.ended_at,
            transcript_files: call
                .transcription
                .map(|t| t.closed_captions_files)
                .unwrap_or_default(),
        }
    }
}

pub struct StreamVideoClient {
    client: AuthenticatedClient,
    /// Transcript downloads go to pre-signed CDN URLs and must not carry credentials
    downloads: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: SecretString,
}

impl StreamVideoClient {
    pub fn new(api_key: &str, api_secret: SecretString, base_url: &str) -> Result<Self, Error> {
        let server_token = sign(&ServerClaims { server: true }, &api_secret)?;

        let client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(ApiKeyAuth::new(
                ApiKeyProvider::StreamVideo,
                SecretString::new(server_token),
            )))
            .build()?;

        Ok(Self {
            client,
            downloads: download_client(DOWNLOAD_TIMEOUT)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret,
        })
    }

    /// Replaces the retrying client, mainly so tests fail fast.
    pub fn with_max_retries(mut self, max_retries: u32) -> Result<Self, Error> {
        let server_token = sign(&ServerClaims { server: true }, &self.api_secret)?;
        self.client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(ApiKeyAuth::new(
                ApiKeyProvider::StreamVideo,
                SecretString::new(server_token),
            )))
            .with_max_retries(max_retries)
            .build()?;
        Ok(self)
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        self.downloads = download_client(timeout)?;
        Ok(self)
    }

    fn call_url(&self, call_type: &str, call_id: &str, suffix: &str) -> String {
        format!(
            "{}/video/call/{call_type}/{call_id}{suffix}?api_key={}",
            self.base_url, self.api_key
        )
    }

    async fn read_call(&self, response: reqwest::Response) -> Result<CallInfo, AiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER_ID, status, body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;
        let call: CallResponse = serde_json::from_str(&body)?;
        Ok(call.call.into())
    }
}

fn sign<T: Serialize>(claims: &T, secret: &SecretString) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
}

#[async_trait]
impl Provider for StreamVideoClient {
    async fn get_or_create_call(&self, request: CallRequest) -> Result<CallInfo, AiError> {
        debug!("Get or create call {}:{}", request.call_type, request.call_id);

        let response = self
            .client
            .post(self.call_url(&request.call_type, &request.call_id, ""))
            .json(&json!({
                "data": {
                    "created_by_id": request.created_by_id,
                    "custom": request.custom,
                }
            }))
            .send()
            .await
            .map_err(|e| request_error(PROVIDER_ID, e))?;

        let call = self.read_call(response).await?;
        info!("Call {} is ready", call.cid);
        Ok(call)
    }

    async fn end_call(&self, call_type: &str, call_id: &str) -> Result<(), AiError> {
        let response = self
            .client
            .post(self.call_url(call_type, call_id, "/mark_ended"))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| request_error(PROVIDER_ID, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER_ID, status, body));
        }

        info!("Call {call_type}:{call_id} marked ended");
        Ok(())
    }

    async fn get_call(&self, call_type: &str, call_id: &str) -> Result<CallInfo, AiError> {
        let response = self
            .client
            .get(self.call_url(call_type, call_id, ""))
            .send()
            .await
            .map_err(|e| request_error(PROVIDER_ID, e))?;

        self.read_call(response).await
    }

    async fn fetch_transcript(&self, url: &str) -> Result<String, AiError> {
        let response = self.downloads.get(url).send().await.map_err(download_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Provider(format!(
                "Transcript fetch failed: {status}"
            )));
        }

        response.text().await.map_err(download_error)
    }

    fn create_user_token(&self, user_id: &str, ttl: Duration) -> Result<String, AiError> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            user_id,
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };

        sign(&claims, &self.api_secret)
            .map_err(|e| AiError::Configuration(format!("Could not sign user token: {e}")))
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

fn download_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .build()
}

fn download_error(err: reqwest::Error) -> AiError {
    warn!("Transcript download failed: {err}");
    if err.is_timeout() {
        AiError::Timeout(err.to_string())
    } else {
        AiError::Network(err.to_string())
    }
}
