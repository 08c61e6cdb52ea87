//! API key authentication trait and implementation.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Known API key providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyProvider {
    StreamVideo,
    OpenAi,
}

impl ApiKeyProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyProvider::StreamVideo => "stream_video",
            ApiKeyProvider::OpenAi => "openai",
        }
    }
}

/// Authentication method for HTTP requests.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    /// Custom header with optional prefix (e.g., "Authorization: Token xxx")
    ApiKeyHeader {
        header_name: String,
        prefix: Option<String>,
    },
    /// Standard Bearer token
    BearerToken,
}

/// Trait for authenticating HTTP requests with API keys or bearer tokens.
pub trait ProviderAuth: Send + Sync {
    fn provider(&self) -> ApiKeyProvider;

    fn auth_method(&self) -> AuthMethod;

    /// Headers carrying the credential. Values are marked sensitive so they
    /// never show up in debug output.
    fn headers(&self) -> Result<HeaderMap, Error>;
}

/// API key authentication with a provider-specific header layout.
///
/// ```rust,ignore
/// // Call platform: Authorization: <server jwt>, stream-auth-type: jwt
/// let auth = ApiKeyAuth::new(ApiKeyProvider::StreamVideo, SecretString::new(jwt));
/// ```
pub struct ApiKeyAuth {
    provider: ApiKeyProvider,
    api_key: SecretString,
    header_name: String,
    prefix: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(provider: ApiKeyProvider, api_key: SecretString) -> Self {
        let prefix = match provider {
            ApiKeyProvider::StreamVideo => None,
            ApiKeyProvider::OpenAi => Some("Bearer".to_string()),
        };

        Self {
            provider,
            api_key,
            header_name: AUTHORIZATION.as_str().to_string(),
            prefix,
        }
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }
}

impl ProviderAuth for ApiKeyAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn auth_method(&self) -> AuthMethod {
        AuthMethod::ApiKeyHeader {
            header_name: self.header_name.clone(),
            prefix: self.prefix.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let auth_value = match &self.prefix {
            Some(prefix) => format!("{} {}", prefix, self.api_key.expose_secret()),
            None => self.api_key.expose_secret().to_string(),
        };

        let header_name = HeaderName::from_bytes(self.header_name.as_bytes()).map_err(|_| {
            api_key_error(ApiKeyErrorKind::InvalidFormat, "Invalid auth header name")
        })?;
        let mut value = HeaderValue::from_str(&auth_value).map_err(|_| {
            api_key_error(ApiKeyErrorKind::InvalidFormat, "API key is not a valid header value")
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header_name, value);

        if self.provider == ApiKeyProvider::StreamVideo {
            headers.insert(
                HeaderName::from_static("stream-auth-type"),
                HeaderValue::from_static("jwt"),
            );
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_provider_as_str() {
        assert_eq!(ApiKeyProvider::StreamVideo.as_str(), "stream_video");
        assert_eq!(ApiKeyProvider::OpenAi.as_str(), "openai");
    }

    #[test]
    fn test_stream_video_uses_raw_token_and_jwt_auth_type() {
        let auth = ApiKeyAuth::new(
            ApiKeyProvider::StreamVideo,
            SecretString::new("server.jwt.token".to_string()),
        );

        let headers = auth.headers().unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "server.jwt.token");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
        assert_eq!(headers.get("stream-auth-type").unwrap(), "jwt");
        assert_eq!(
            auth.auth_method(),
            AuthMethod::ApiKeyHeader {
                header_name: "authorization".to_string(),
                prefix: None
            }
        );
    }

    #[test]
    fn test_openai_key_is_prefixed() {
        let auth = ApiKeyAuth::new(ApiKeyProvider::OpenAi, SecretString::new("sk-test".to_string()));

        let headers = auth.headers().unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sk-test");
        assert!(headers.get("stream-auth-type").is_none());
    }

    #[test]
    fn test_newline_in_key_is_rejected() {
        let auth = ApiKeyAuth::new(
            ApiKeyProvider::OpenAi,
            SecretString::new("bad\nkey".to_string()),
        );

        assert_eq!(
            auth.headers().unwrap_err().error_kind,
            crate::ErrorKind::ApiKey(ApiKeyErrorKind::InvalidFormat)
        );
    }
}
