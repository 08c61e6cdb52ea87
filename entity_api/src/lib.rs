use chrono::Utc;
use log::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{agents, meeting_status, meetings, stream_token, transcript_entry, users, Id};

pub mod agent;
pub mod error;
pub mod meeting;
pub mod mutate;
pub mod user;

pub(crate) fn uuid_parse_str(uuid_str: &str) -> Result<Id, error::Error> {
    Id::parse_str(uuid_str).map_err(|_| error::Error {
        source: None,
        error_kind: error::EntityApiErrorKind::InvalidQueryTerm,
    })
}

/// Parses a meeting id as it appears inside call-platform identifiers.
pub fn parse_id(id_str: &str) -> Result<Id, error::Error> {
    uuid_parse_str(id_str.trim())
}

/// Inserts a demo user with one agent so a fresh database can be exercised end to end.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let demo_user = users::ActiveModel {
        email: Set("demo@meetings.local".to_owned()),
        name: Set("Demo User".to_owned()),
        password: Set(user::generate_hash("password".to_owned())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Seeded user {} ({})", demo_user.email, demo_user.id);

    let demo_agent = agents::ActiveModel {
        user_id: Set(demo_user.id),
        name: Set("Standup facilitator".to_owned()),
        instructions: Set(
            "You facilitate a short daily standup. Ask each participant what they did, \
             what they plan to do and whether anything blocks them."
                .to_owned(),
        ),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Seeded agent {} ({})", demo_agent.name, demo_agent.id);

    meetings::ActiveModel {
        user_id: Set(demo_user.id),
        agent_id: Set(demo_agent.id),
        name: Set("Daily standup".to_owned()),
        status: Set(meeting_status::MeetingStatus::Upcoming),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::EntityApiErrorKind;

    #[test]
    fn parse_id_accepts_surrounding_whitespace() {
        let id = Id::new_v4();
        assert_eq!(parse_id(&format!(" {id} ")).unwrap(), id);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert_eq!(
            parse_id("not-a-uuid").unwrap_err().error_kind,
            EntityApiErrorKind::InvalidQueryTerm
        );
    }
}
