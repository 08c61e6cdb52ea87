//! Summarization provider trait.

use crate::types::summary::Request;
use crate::Error;
use async_trait::async_trait;

/// A single text-generation call: system instruction plus prompt in, plain text out.
///
/// Implementations make exactly one attempt; retrying is the caller's concern.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn summarize(&self, request: Request) -> Result<String, Error>;

    fn provider_id(&self) -> &str;
}
