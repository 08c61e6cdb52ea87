//! Webhook signature validation.

mod hmac;

pub use hmac::HmacWebhookValidator;

use std::collections::HashMap;

use crate::error::Error;

/// Trait for validating webhook signatures.
pub trait WebhookValidator: Send + Sync {
    /// Validate a webhook request against its headers and raw body.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match the
    /// body and `Err` when the signature is missing or malformed.
    fn validate(&self, headers: &HashMap<String, String>, body: &[u8]) -> Result<bool, Error>;

    /// Get the provider identifier for this validator.
    fn provider_id(&self) -> &str;
}
