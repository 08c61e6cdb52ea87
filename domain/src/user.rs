use crate::caller::AuthenticatedCaller;
use crate::stream_token::StreamToken;
use crate::{error::Error, users, Id};
use log::*;
use meeting_ai::traits::call_platform;
use sea_orm::DatabaseConnection;
use std::time::Duration;

pub use entity_api::user::{create, find_by_email, AuthSession, Backend, Credentials};

/// How long a browser client may use a call-platform token.
pub const STREAM_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub async fn find_by_id(db: &DatabaseConnection, user_id: Id) -> Result<users::Model, Error> {
    Ok(entity_api::user::find_by_id(db, user_id).await?)
}

/// Issues a call-platform token for the caller. Identity always comes from the
/// authenticated caller, never from request input.
pub async fn create_stream_token(
    db: &DatabaseConnection,
    call_platform: &dyn call_platform::Provider,
    caller: AuthenticatedCaller,
) -> Result<StreamToken, Error> {
    let user = find_by_id(db, caller.user_id()).await?;
    let user_id = user.id.to_string();

    let token = call_platform.create_user_token(&user_id, STREAM_TOKEN_TTL)?;
    debug!("Issued stream token for user {user_id}");

    Ok(StreamToken {
        token,
        api_key: call_platform.api_key().to_string(),
        user_id,
        user_name: user.name,
    })
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::test_support::FakeCallPlatform;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn stream_token_is_bound_to_the_caller() -> Result<(), Error> {
        let now = Utc::now();
        let user = users::Model {
            id: Id::new_v4(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            password: "hash".to_string(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()]])
            .into_connection();

        let token =
            create_stream_token(&db, &FakeCallPlatform::default(), AuthenticatedCaller::from(&user))
                .await?;

        assert_eq!(token.user_id, user.id.to_string());
        assert_eq!(token.user_name, "Ana");
        assert_eq!(token.api_key, "fake-api-key");
        assert_eq!(token.token, format!("token-{}-86400", user.id));
        Ok(())
    }
}
