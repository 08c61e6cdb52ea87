//! OpenAI client: chat completions for summaries and realtime voice sessions.

use super::{request_error, status_error};
use crate::error::Error;
use async_trait::async_trait;
use log::*;
use meeting_ai::traits::{realtime, summarizer};
use meeting_ai::types::realtime::{Session, SessionConfig};
use meeting_ai::types::summary::Request;
use meeting_ai::Error as AiError;
use meeting_auth::api_key::{ApiKeyProvider, BearerTokenAuth};
use meeting_auth::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;

const PROVIDER_ID: &str = "openai";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RealtimeSession {
    id: String,
    client_secret: ClientSecret,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    value: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

pub struct OpenAiClient {
    client: AuthenticatedClient,
    /// Never retries: the transcript job owns retries for summaries
    summaries: AuthenticatedClient,
    /// SDP exchange authenticates with a session's client secret, not the API key
    sdp: AuthenticatedClient,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: SecretString, base_url: &str) -> Result<Self, Error> {
        Self::with_max_retries(api_key, base_url, 3)
    }

    pub fn with_max_retries(
        api_key: SecretString,
        base_url: &str,
        max_retries: u32,
    ) -> Result<Self, Error> {
        let client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(BearerTokenAuth::new(
                ApiKeyProvider::OpenAi,
                api_key.clone(),
            )))
            .with_max_retries(max_retries)
            .build()?;
        let summaries = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(BearerTokenAuth::new(ApiKeyProvider::OpenAi, api_key)))
            .with_max_retries(0)
            .build()?;
        let sdp = AuthenticatedClientBuilder::new()
            .with_max_retries(max_retries)
            .build()?;

        Ok(Self {
            client,
            summaries,
            sdp,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(status_error(PROVIDER_ID, status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl summarizer::Provider for OpenAiClient {
    async fn summarize(&self, request: Request) -> Result<String, AiError> {
        debug!("Requesting summary from {} ({} chars)", request.model, request.prompt.len());

        let response = self
            .summaries
            .post(format!("{}/chat/completions", self.base_url))
            .json(&json!({
                "model": request.model,
                "messages": [
                    { "role": "system", "content": request.system },
                    { "role": "user", "content": request.prompt },
                ],
            }))
            .send()
            .await
            .map_err(|e| request_error(PROVIDER_ID, e))?;

        let completion: ChatCompletion = Self::read_json(response).await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AiError::Deserialization("completion had no content".to_string()))
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

#[async_trait]
impl realtime::Provider for OpenAiClient {
    async fn create_session(&self, config: SessionConfig) -> Result<Session, AiError> {
        let response = self
            .client
            .post(format!("{}/realtime/sessions", self.base_url))
            .json(&config)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER_ID, e))?;

        let session: RealtimeSession = Self::read_json(response).await?;
        info!("Realtime session {} created with voice {}", session.id, config.voice);

        Ok(Session {
            session_id: session.id,
            client_secret: session.client_secret.value,
            expires_at: session.client_secret.expires_at,
        })
    }

    async fn exchange_sdp(
        &self,
        client_secret: &str,
        model: &str,
        offer_sdp: &str,
    ) -> Result<String, AiError> {
        let response = self
            .sdp
            .post(format!("{}/realtime?model={model}", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {client_secret}"))
            .header(CONTENT_TYPE, "application/sdp")
            .body(offer_sdp.to_string())
            .send()
            .await
            .map_err(|e| request_error(PROVIDER_ID, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(status_error(PROVIDER_ID, status, body));
        }

        Ok(body)
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meeting_ai::traits::realtime::Provider as _;
    use meeting_ai::traits::summarizer::Provider as _;
    use mockito::Matcher;

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::with_max_retries(SecretString::new("sk-test".to_string()), base_url, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn summarize_returns_the_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({ "model": "gpt-4o-mini" })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "**Overview**\nShort."}}]}"#)
            .create_async()
            .await;

        let summary = client(&server.url())
            .summarize(Request {
                system: "Summarize".to_string(),
                prompt: "[Ana]: hi".to_string(),
                model: "gpt-4o-mini".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(summary, "**Overview**\nShort.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_key_is_an_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "bad key"}}"#)
            .create_async()
            .await;

        let result = client(&server.url())
            .summarize(Request {
                system: String::new(),
                prompt: String::new(),
                model: "gpt-4o-mini".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AiError::Authentication(_))));
    }

    #[tokio::test]
    async fn failed_summary_is_attempted_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(1)
            .create_async()
            .await;
        let client = OpenAiClient::with_max_retries(
            SecretString::new("sk-test".to_string()),
            &server.url(),
            3,
        )
        .unwrap();

        let result = client
            .summarize(Request {
                system: String::new(),
                prompt: "[Ana]: hi".to_string(),
                model: "gpt-4o-mini".to_string(),
            })
            .await;

        assert!(result.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_session_returns_the_client_secret() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/realtime/sessions")
            .match_body(Matcher::PartialJson(json!({
                "voice": "alloy",
                "turn_detection": { "type": "server_vad" }
            })))
            .with_status(200)
            .with_body(r#"{"id": "sess_1", "client_secret": {"value": "ek_1", "expires_at": 1700000000}}"#)
            .create_async()
            .await;

        let session = client(&server.url())
            .create_session(SessionConfig::new("gpt-4o-realtime-preview", "alloy", "Be brief."))
            .await
            .unwrap();

        assert_eq!(session.session_id, "sess_1");
        assert_eq!(session.client_secret, "ek_1");
        assert_eq!(session.expires_at, Some(1_700_000_000));
    }

    #[tokio::test]
    async fn exchange_sdp_uses_the_session_secret() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/realtime")
            .match_query(Matcher::UrlEncoded(
                "model".into(),
                "gpt-4o-realtime-preview".into(),
            ))
            .match_header("authorization", "Bearer ek_1")
            .match_header("content-type", "application/sdp")
            .match_body("v=0 offer")
            .with_status(201)
            .with_body("v=0 answer")
            .create_async()
            .await;

        let answer = client(&server.url())
            .exchange_sdp("ek_1", "gpt-4o-realtime-preview", "v=0 offer")
            .await
            .unwrap();

        assert_eq!(answer, "v=0 answer");
        mock.assert_async().await;
    }
}
