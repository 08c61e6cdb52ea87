//! Short-lived realtime voice sessions for an agent.

use crate::agent;
use crate::caller::AuthenticatedCaller;
use crate::error::Error;
use crate::Id;
use log::*;
use meeting_ai::traits::realtime;
use meeting_ai::types::realtime::{Session, SessionConfig};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use service::config::Config;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSettings {
    pub model: String,
    pub voice: String,
}

impl VoiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.realtime_model.clone(),
            voice: config.realtime_voice.clone(),
        }
    }
}

/// What a browser needs to open its own connection to the realtime platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VoiceSession {
    pub client_secret: String,
    pub session_id: String,
}

impl From<Session> for VoiceSession {
    fn from(session: Session) -> Self {
        Self {
            client_secret: session.client_secret,
            session_id: session.session_id,
        }
    }
}

/// Agent instructions, or a generic persona built from the agent name when they are blank.
pub fn instructions_for(name: &str, instructions: &str) -> String {
    if !instructions.trim().is_empty() {
        return instructions.to_string();
    }
    let name = name.trim();
    let persona = if name.is_empty() {
        "a helpful AI assistant"
    } else {
        name
    };
    format!("You are {persona}. Be conversational and helpful.")
}

/// Creates a realtime session speaking as one of the caller's agents.
pub async fn create(
    db: &DatabaseConnection,
    provider: &dyn realtime::Provider,
    settings: &VoiceSettings,
    caller: AuthenticatedCaller,
    agent_id: Id,
) -> Result<VoiceSession, Error> {
    let agent = agent::find_by_id(db, caller, agent_id).await?;

    let config = SessionConfig::new(
        &settings.model,
        &settings.voice,
        &instructions_for(&agent.name, &agent.instructions),
    );
    let session = provider.create_session(config).await?;
    info!(
        "Voice session {} opened for agent {agent_id} via {}",
        session.session_id,
        provider.provider_id()
    );

    Ok(session.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_instructions_fall_back_to_a_persona() {
        assert_eq!(
            instructions_for("Coach Kim", "  "),
            "You are Coach Kim. Be conversational and helpful."
        );
        assert_eq!(
            instructions_for("", ""),
            "You are a helpful AI assistant. Be conversational and helpful."
        );
        assert_eq!(instructions_for("Coach Kim", "Ask questions."), "Ask questions.");
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod session_tests {
    use super::*;
    use crate::test_support::{agent_model, FakeRealtime};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn settings() -> VoiceSettings {
        VoiceSettings {
            model: "gpt-4o-realtime-preview".to_string(),
            voice: "alloy".to_string(),
        }
    }

    #[tokio::test]
    async fn session_uses_the_agent_instructions_and_server_vad() -> Result<(), Error> {
        let agent = agent_model(Id::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[agent.clone()]])
            .into_connection();
        let provider = FakeRealtime::default();

        let session = create(
            &db,
            &provider,
            &settings(),
            AuthenticatedCaller::new(agent.user_id),
            agent.id,
        )
        .await?;

        assert_eq!(session.client_secret, "ek_test");
        let configs = provider.configs();
        assert_eq!(configs[0].instructions, agent.instructions);
        assert_eq!(configs[0].voice, "alloy");
        assert_eq!(configs[0].turn_detection.silence_duration_ms, 700);
        Ok(())
    }

    #[tokio::test]
    async fn provider_rejection_surfaces_as_an_external_error() {
        let agent = agent_model(Id::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[agent.clone()]])
            .into_connection();
        let provider = FakeRealtime {
            failing: true,
            ..Default::default()
        };

        let result = create(
            &db,
            &provider,
            &settings(),
            AuthenticatedCaller::new(agent.user_id),
            agent.id,
        )
        .await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            crate::error::DomainErrorKind::External(_)
        ));
    }
}
