use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::{AppState, Error};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use domain::user as UserApi;
use log::*;
use service::config::ApiVersion;

/// POST issue a call-platform token for the logged in user
#[utoipa::path(
    post,
    path = "/stream_token",
    params(ApiVersion),
    responses(
        (status = 200, description = "Successfully issued a call-platform token", body = domain::stream_token::StreamToken),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Call platform credentials are not configured"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create stream token for user {}", user.0.id);

    let stream_token = UserApi::create_stream_token(
        app_state.db_conn_ref(),
        app_state.call_platform.as_ref(),
        user.caller(),
    )
    .await?;

    Ok(Json(ApiResponse::ok(stream_token)))
}
