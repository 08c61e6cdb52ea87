//! # meeting-auth
//!
//! Authentication primitives shared by the meeting platform's outbound and
//! inbound integrations:
//! - API key and bearer authentication for the call platform and OpenAI
//! - HTTP client building with retry middleware
//! - Webhook signature validation for call-platform events
//!
//! ```rust,ignore
//! use meeting_auth::{
//!     api_key::{ApiKeyProvider, BearerTokenAuth},
//!     http::AuthenticatedClientBuilder,
//!     webhook::{HmacWebhookValidator, WebhookValidator},
//! };
//! ```

pub mod api_key;
pub mod error;
pub mod http;
pub mod webhook;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
