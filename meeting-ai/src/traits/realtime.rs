//! Realtime voice provider trait.

use crate::types::realtime::{Session, SessionConfig};
use crate::Error;
use async_trait::async_trait;

/// Abstraction for a realtime voice API that an agent speaks through.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Create a session and return the short-lived client credential for it.
    async fn create_session(&self, config: SessionConfig) -> Result<Session, Error>;

    /// Send an SDP offer authenticated with a session's client secret and
    /// return the provider's SDP answer.
    async fn exchange_sdp(
        &self,
        client_secret: &str,
        model: &str,
        offer_sdp: &str,
    ) -> Result<String, Error>;

    fn provider_id(&self) -> &str;
}
