use axum::http::StatusCode;
use serde::Serialize;

pub(crate) mod agent_controller;
pub(crate) mod health_check_controller;
pub(crate) mod meeting_controller;
pub(crate) mod stream_token_controller;
pub(crate) mod user_session_controller;
pub(crate) mod webhook_controller;

/// Envelope for every successful JSON response. Errors are rendered by `crate::Error`
/// and do not use it.
#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }
}
