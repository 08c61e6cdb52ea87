//! HMAC-SHA256 webhook signature validation.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::WebhookValidator;
use crate::error::{webhook_error, Error, WebhookErrorKind};

type HmacSha256 = Hmac<Sha256>;

/// Validates a hex-encoded HMAC-SHA256 of the raw request body.
///
/// Header names are matched case-insensitively. A `sha256=` prefix on the
/// signature is tolerated.
pub struct HmacWebhookValidator {
    provider_id: String,
    secret: SecretString,
    signature_header: String,
}

impl HmacWebhookValidator {
    pub fn new(provider_id: &str, secret: SecretString, signature_header: &str) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            secret,
            signature_header: signature_header.to_ascii_lowercase(),
        }
    }

    /// Hex-encoded signature for `body`. Used by senders and tests.
    pub fn sign(&self, body: &[u8]) -> Result<String, Error> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256, Error> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| webhook_error(WebhookErrorKind::InvalidPayload, "Invalid HMAC key"))
    }
}

impl WebhookValidator for HmacWebhookValidator {
    fn validate(&self, headers: &HashMap<String, String>, body: &[u8]) -> Result<bool, Error> {
        let signature = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&self.signature_header))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                webhook_error(
                    WebhookErrorKind::MissingSignature,
                    &format!("Missing signature header: {}", self.signature_header),
                )
            })?;

        let expected_sig = hex::decode(signature.trim_start_matches("sha256=")).map_err(|_| {
            webhook_error(WebhookErrorKind::InvalidSignature, "Invalid signature format")
        })?;

        let mut mac = self.mac()?;
        mac.update(body);

        // verify_slice compares in constant time
        Ok(mac.verify_slice(&expected_sig).is_ok())
    }

    fn provider_id(&self) -> &str {
        &self.provider_id
    }
}
