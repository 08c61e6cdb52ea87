//! Controller for handling webhooks from the call platform.
//!
//! The route is unauthenticated; deliveries are verified by HMAC signature inside
//! `domain::call_event`. Every delivery is acknowledged with `200 {"status":"ok"}`,
//! including ones that fail verification, so the platform never retries.

use crate::AppState;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use log::*;
use serde::Serialize;
use std::collections::HashMap;

/// Response for webhook acknowledgment
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
}

impl WebhookResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Header names are lowercased; values that are not visible ASCII are skipped.
fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_lowercase(), value.to_string()))
        })
        .collect()
}

/// POST /webhooks/stream
///
/// The body is taken as raw bytes because the signature covers the exact payload.
pub async fn call_platform_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let outcome = app_state
        .call_events
        .handle(
            app_state.db_conn_ref(),
            &app_state.event_publisher,
            &header_map(&headers),
            &body,
        )
        .await;

    debug!("Call-platform webhook outcome: {outcome:?}");

    (StatusCode::OK, Json(WebhookResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_names_are_lowercased() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Signature", HeaderValue::from_static("abc123"));

        let map = header_map(&headers);

        assert_eq!(map.get("x-signature").map(String::as_str), Some("abc123"));
    }
}
