use crate::{controller::health_check_controller, middleware::auth::require_auth, AppState};
use axum::{
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};

use crate::controller::{
    agent_controller, meeting_controller, stream_token_controller, user_session_controller,
    webhook_controller,
};
use crate::sse::handler::sse_handler;

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Meetings Platform API"
        ),
        paths(
            agent_controller::create,
            agent_controller::index,
            agent_controller::read,
            agent_controller::update,
            agent_controller::delete,
            agent_controller::voice_session,
            health_check_controller::health_check,
            meeting_controller::create,
            meeting_controller::index,
            meeting_controller::stats,
            meeting_controller::read,
            meeting_controller::update,
            meeting_controller::delete,
            meeting_controller::start,
            meeting_controller::end,
            meeting_controller::cancel,
            meeting_controller::transcript,
            stream_token_controller::create,
            user_session_controller::login,
            user_session_controller::delete,
        ),
        components(
            schemas(
                domain::agents::Model,
                domain::meetings::Model,
                domain::meeting_status::MeetingStatus,
                domain::transcript_entry::TranscriptEntry,
                domain::stream_token::StreamToken,
                domain::users::Model,
                domain::user::Credentials,
                domain::agent::NewAgent,
                domain::meeting::NewMeeting,
                domain::meeting::EndParams,
                domain::meeting::MeetingStats,
                domain::meeting::Transcript,
                domain::voice_session::VoiceSession,
                crate::params::agent::UpdateParams,
                crate::params::meeting::UpdateParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "meetings_platform", description = "Meetings with AI agents API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session id value returned from successful login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(agent_routes(app_state.clone()))
        .merge(health_routes())
        .merge(meeting_routes(app_state.clone()))
        .merge(sse_routes(app_state.clone()))
        .merge(stream_token_routes(app_state.clone()))
        .merge(user_session_routes(app_state.clone()))
        .merge(user_session_protected_routes(app_state.clone()))
        .merge(webhook_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn meeting_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/meetings", post(meeting_controller::create))
        .route("/meetings", get(meeting_controller::index))
        .route("/meetings/stats", get(meeting_controller::stats))
        .route("/meetings/{id}", get(meeting_controller::read))
        .route("/meetings/{id}", put(meeting_controller::update))
        .route("/meetings/{id}", delete(meeting_controller::delete))
        .route("/meetings/{id}/start", post(meeting_controller::start))
        .route("/meetings/{id}/end", post(meeting_controller::end))
        .route("/meetings/{id}/cancel", post(meeting_controller::cancel))
        .route(
            "/meetings/{id}/transcript",
            get(meeting_controller::transcript),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn agent_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/agents", post(agent_controller::create))
        .route("/agents", get(agent_controller::index))
        .route("/agents/{id}", get(agent_controller::read))
        .route("/agents/{id}", put(agent_controller::update))
        .route("/agents/{id}", delete(agent_controller::delete))
        .route(
            "/agents/{id}/voice_session",
            post(agent_controller::voice_session),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn stream_token_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/stream_token", post(stream_token_controller::create))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

pub fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/login", post(user_session_controller::login))
        .with_state(app_state)
}

pub fn user_session_protected_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/delete", get(user_session_controller::delete))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

// Authenticated by HMAC signature rather than by session
fn webhook_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/webhooks/stream",
            post(webhook_controller::call_platform_webhook),
        )
        .with_state(app_state)
}
