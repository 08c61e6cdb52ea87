//! API key authentication for service providers.
//!
//! The call platform authenticates server requests with a signed token in the
//! `Authorization` header; OpenAI uses a standard bearer token.

mod auth;
mod bearer;

pub use auth::{ApiKeyAuth, ApiKeyProvider, AuthMethod, ProviderAuth};
pub use bearer::BearerTokenAuth;
