use chrono::Utc;
use password_auth::generate_hash;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{DbBackend, Statement, Value};

#[derive(DeriveMigrationName)]
pub struct Migration;

const INITIAL_USER_EMAIL: &str = "admin@meetings.local";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    // NOTE: raw SQL keeps this migration independent of later entity changes.
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = Utc::now();

        manager
            .get_connection()
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                    INSERT INTO meetings_platform.users (email, name, password, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (email) DO NOTHING
                "#,
                vec![
                    Value::String(Some(Box::new(INITIAL_USER_EMAIL.to_owned()))),
                    Value::String(Some(Box::new("Admin".to_owned()))),
                    Value::String(Some(Box::new(generate_hash("password")))),
                    Value::ChronoDateTimeUtc(Some(Box::new(now))),
                    Value::ChronoDateTimeUtc(Some(Box::new(now))),
                ],
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "DELETE FROM meetings_platform.users WHERE email = $1",
                vec![Value::String(Some(Box::new(INITIAL_USER_EMAIL.to_owned())))],
            ))
            .await?;

        Ok(())
    }
}
