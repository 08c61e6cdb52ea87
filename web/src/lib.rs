use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum_login::{
    tower_sessions::{Expiry, SessionManagerLayer},
    AuthManagerLayerBuilder,
};
use domain::call_event::CallEventIngress;
use domain::gateway::Unconfigured;
use domain::user::Backend;
use domain::voice_session::VoiceSettings;
use events::EventPublisher;
use log::*;
use meeting_ai::traits::{call_platform, realtime};
use sea_orm::DatabaseConnection;
use service::config::{ApiVersion, Config};
use std::io;
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_sessions_sqlx_store::PostgresStore;

mod controller;
mod error;
pub(crate) mod extractors;
pub(crate) mod middleware;
pub(crate) mod params;
mod router;
pub(crate) mod sse;

pub use error::{Error, Result};

const SESSION_TABLE: &str = "authorized_sessions";

/// Web-level state: the service infrastructure plus everything the controllers call into.
/// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub sse_manager: Arc<::sse::Manager>,
    pub event_publisher: EventPublisher,
    pub call_platform: Arc<dyn call_platform::Provider>,
    pub realtime: Arc<dyn realtime::Provider>,
    pub call_events: Arc<CallEventIngress>,
    pub voice_settings: VoiceSettings,
}

impl AppState {
    /// State with no event handlers and unconfigured external providers. The binary
    /// replaces these through the `with_*` methods.
    pub fn new(app_config: Config, db: &Arc<DatabaseConnection>) -> Self {
        let call_events = Arc::new(CallEventIngress::new(app_config.webhook_secret()));
        let voice_settings = VoiceSettings::from_config(&app_config);

        Self {
            service_state: service::AppState::new(app_config, db),
            sse_manager: Arc::new(::sse::Manager::new()),
            event_publisher: EventPublisher::new(),
            call_platform: Arc::new(Unconfigured),
            realtime: Arc::new(Unconfigured),
            call_events,
            voice_settings,
        }
    }

    pub fn with_sse_manager(mut self, sse_manager: Arc<::sse::Manager>) -> Self {
        self.sse_manager = sse_manager;
        self
    }

    pub fn with_event_publisher(mut self, event_publisher: EventPublisher) -> Self {
        self.event_publisher = event_publisher;
        self
    }

    pub fn with_call_platform(mut self, provider: Arc<dyn call_platform::Provider>) -> Self {
        self.call_platform = provider;
        self
    }

    pub fn with_realtime(mut self, provider: Arc<dyn realtime::Provider>) -> Self {
        self.realtime = provider;
        self
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

pub async fn init_server(app_state: AppState) -> io::Result<()> {
    info!("Using database {}", app_state.config().database_target());

    let config = app_state.config().clone();

    // Sessions share the application's Postgres pool and schema
    let session_store = PostgresStore::new(
        app_state
            .db_conn_ref()
            .get_postgres_connection_pool()
            .clone(),
    )
    .with_schema_name(service::DB_SCHEMA)
    .and_then(|store| store.with_table_name(SESSION_TABLE))
    .map_err(io::Error::other)?;

    session_store.migrate().await.map_err(io::Error::other)?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.is_production())
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            config.backend_session_expiry_seconds as i64,
        )));

    let backend = Backend::new(&app_state.service_state.database_connection);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let server_url = format!("{host}:{}", config.port);
    let listener = TcpListener::bind(&server_url).await?;

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid allowed origin {origin}: {e}");
                None
            }
        })
        .collect();
    info!("Allowed origins: {allowed_origins:?}");

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(ApiVersion::field_name()),
        ])
        .allow_origin(allowed_origins);

    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(
        listener,
        router::define_routes(app_state)
            .layer(auth_layer)
            .layer(cors_layer),
    )
    .await
}
