use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::agent::{IndexParams, UpdateParams};
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use domain::agent::{self as AgentApi, NewAgent};
use domain::voice_session as VoiceSessionApi;
use domain::{Id, IntoUpdateMap};
use log::*;
use serde_json::json;
use service::config::ApiVersion;

/// POST create a new Agent
#[utoipa::path(
    post,
    path = "/agents",
    params(ApiVersion),
    request_body = domain::agent::NewAgent,
    responses(
        (status = 201, description = "Successfully created a new Agent", body = domain::agents::Model),
        (status = 401, description = "Unauthorized"),
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
    Json(new_agent): Json<NewAgent>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new Agent named {:?}", new_agent.name);

    let agent = AgentApi::create(app_state.db_conn_ref(), user.caller(), new_agent).await?;

    Ok(Json(ApiResponse::created(agent)))
}

#[utoipa::path(
    get,
    path = "/agents",
    params(ApiVersion, IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved Agents", body = [domain::agents::Model]),
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
    debug!("GET all Agents with params: {params:?}");

    let agents = AgentApi::list(app_state.db_conn_ref(), user.caller(), params.into()).await?;

    Ok(Json(ApiResponse::ok(agents)))
}

#[utoipa::path(
    get,
    path = "/agents/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Agent id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved an Agent", body = domain::agents::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
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
    debug!("GET Agent by id: {id}");

    let agent = AgentApi::find_by_id(app_state.db_conn_ref(), user.caller(), id).await?;

    Ok(Json(ApiResponse::ok(agent)))
}

#[utoipa::path(
    put,
    path = "/agents/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Agent to update"),
    ),
    request_body = crate::params::agent::UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the Agent", body = domain::agents::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
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
    debug!("PUT Update Agent {id}");

    let agent = AgentApi::update(
        app_state.db_conn_ref(),
        user.caller(),
        id,
        params.into_update_map(),
    )
    .await?;

    Ok(Json(ApiResponse::ok(agent)))
}

/// DELETE an Agent that no Meeting refers to
#[utoipa::path(
    delete,
    path = "/agents/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Agent to delete"),
    ),
    responses(
        (status = 200, description = "Successfully deleted the Agent"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
        (status = 409, description = "Agent is still used by meetings"),
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
    debug!("DELETE Agent by id: {id}");

    AgentApi::delete(app_state.db_conn_ref(), user.caller(), id).await?;
    Ok(Json(ApiResponse::ok(json!({"id": id}))))
}

/// POST open a realtime voice session speaking as the Agent.
///
/// The returned client secret is short-lived and lets the browser negotiate media
/// directly with the realtime platform.
#[utoipa::path(
    post,
    path = "/agents/{id}/voice_session",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Agent to speak as"),
    ),
    responses(
        (status = 200, description = "Session created", body = domain::voice_session::VoiceSession),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Agent not found"),
        (status = 502, description = "The realtime platform rejected the request"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn voice_session(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create voice session for Agent {id}");

    let session = VoiceSessionApi::create(
        app_state.db_conn_ref(),
        app_state.realtime.as_ref(),
        &app_state.voice_settings,
        user.caller(),
        id,
    )
    .await?;

    Ok(Json(ApiResponse::ok(session)))
}
