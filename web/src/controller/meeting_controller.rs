use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::meeting::{IndexParams, UpdateParams};
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use domain::meeting::{self as MeetingApi, EndParams, NewMeeting};
use domain::{Id, IntoUpdateMap};
use log::*;
use serde_json::json;
use service::config::ApiVersion;

/// POST create a new upcoming Meeting bound to one of the caller's agents
#[utoipa::path(
    post,
    path = "/meetings",
    params(ApiVersion),
    request_body = domain::meeting::NewMeeting,
    responses(
        (status = 201, description = "Successfully created a new Meeting", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
        (status = 422, description = "Unprocessable Entity"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(new_meeting): Json<NewMeeting>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new Meeting from: {new_meeting:?}");

    let meeting = MeetingApi::create(app_state.db_conn_ref(), user.caller(), new_meeting).await?;

    debug!("New Meeting: {meeting:?}");

    Ok(Json(ApiResponse::created(meeting)))
}

/// GET the caller's Meetings, newest first
#[utoipa::path(
    get,
    path = "/meetings",
    params(ApiVersion, IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved Meetings", body = [domain::meetings::Model]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Meetings with params: {params:?}");

    let meetings =
        MeetingApi::list(app_state.db_conn_ref(), user.caller(), params.into()).await?;

    Ok(Json(ApiResponse::ok(meetings)))
}

/// GET per-status Meeting counts for the caller
#[utoipa::path(
    get,
    path = "/meetings/stats",
    params(ApiVersion),
    responses(
        (status = 200, description = "Successfully retrieved Meeting counts", body = domain::meeting::MeetingStats),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn stats(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let stats = MeetingApi::get_stats(app_state.db_conn_ref(), user.caller()).await?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// GET a particular Meeting specified by its id.
#[utoipa::path(
    get,
    path = "/meetings/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Meeting id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a Meeting", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Meeting by id: {id}");

    let meeting = MeetingApi::find_by_id(app_state.db_conn_ref(), user.caller(), id).await?;

    Ok(Json(ApiResponse::ok(meeting)))
}

/// PUT edit the details of an upcoming Meeting
#[utoipa::path(
    put,
    path = "/meetings/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Meeting to update"),
    ),
    request_body = crate::params::meeting::UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the Meeting", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 409, description = "Meeting has already started"),
        (status = 422, description = "Unprocessable Entity"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Meeting {id} with: {params:?}");

    let meeting = MeetingApi::update(
        app_state.db_conn_ref(),
        user.caller(),
        id,
        params.into_update_map(),
    )
    .await?;

    Ok(Json(ApiResponse::ok(meeting)))
}

#[utoipa::path(
    delete,
    path = "/meetings/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Meeting to delete"),
    ),
    responses(
        (status = 200, description = "Successfully deleted the Meeting"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Meeting by id: {id}");

    MeetingApi::delete(app_state.db_conn_ref(), user.caller(), id).await?;
    Ok(Json(ApiResponse::ok(json!({"id": id}))))
}

/// POST start an upcoming Meeting
#[utoipa::path(
    post,
    path = "/meetings/{id}/start",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Meeting to start"),
    ),
    responses(
        (status = 200, description = "The Meeting is active", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 409, description = "Meeting cannot be started from its current status"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn start(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Start Meeting {id}");

    let meeting = MeetingApi::start(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        app_state.call_platform.as_ref(),
        user.caller(),
        id,
    )
    .await?;

    Ok(Json(ApiResponse::ok(meeting)))
}

/// POST end an active Meeting, queueing its transcript for summarization when one exists
#[utoipa::path(
    post,
    path = "/meetings/{id}/end",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Meeting to end"),
    ),
    request_body = domain::meeting::EndParams,
    responses(
        (status = 200, description = "The Meeting is processing or completed", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 409, description = "Meeting cannot be ended from its current status"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn end(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<EndParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST End Meeting {id}");

    let meeting = MeetingApi::end(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        app_state.call_platform.as_ref(),
        user.caller(),
        id,
        params,
    )
    .await?;

    Ok(Json(ApiResponse::ok(meeting)))
}

/// POST cancel an upcoming or active Meeting
#[utoipa::path(
    post,
    path = "/meetings/{id}/cancel",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Meeting to cancel"),
    ),
    responses(
        (status = 200, description = "The Meeting is cancelled", body = domain::meetings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 409, description = "Meeting has already finished"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn cancel(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Cancel Meeting {id}");

    let meeting = MeetingApi::cancel(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        app_state.call_platform.as_ref(),
        user.caller(),
        id,
    )
    .await?;

    Ok(Json(ApiResponse::ok(meeting)))
}

/// GET the speaker-resolved transcript of a Meeting
#[utoipa::path(
    get,
    path = "/meetings/{id}/transcript",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Meeting"),
    ),
    responses(
        (status = 200, description = "Successfully retrieved the transcript", body = domain::meeting::Transcript),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn transcript(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let transcript =
        MeetingApi::get_transcript(app_state.db_conn_ref(), user.caller(), id).await?;

    Ok(Json(ApiResponse::ok(transcript)))
}
