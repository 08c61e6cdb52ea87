use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS meetings_platform;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO meetings_platform, public;")
            .await?;

        // The application role executes every platform query
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    GRANT ALL PRIVILEGES ON DATABASE meetings TO meetings;
                    GRANT ALL ON SCHEMA meetings_platform TO meetings;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA meetings_platform GRANT ALL ON TABLES TO meetings;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA meetings_platform GRANT ALL ON SEQUENCES TO meetings;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA meetings_platform GRANT ALL ON FUNCTIONS TO meetings;
                END $$;
            "#)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA meetings_platform REVOKE ALL ON FUNCTIONS FROM meetings;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA meetings_platform REVOKE ALL ON SEQUENCES FROM meetings;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA meetings_platform REVOKE ALL ON TABLES FROM meetings;
                    REVOKE ALL ON SCHEMA meetings_platform FROM meetings;
                    REVOKE ALL PRIVILEGES ON DATABASE meetings FROM meetings;
                END $$;
            "#)
            .await?;

        // CASCADE removes every object in the schema
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS meetings_platform CASCADE;")
            .await?;

        Ok(())
    }
}
