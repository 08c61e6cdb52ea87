use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TYPE meetings_platform.meeting_status AS ENUM (
                'upcoming',
                'active',
                'processing',
                'completed',
                'cancelled'
            )",
        )
        .await?;

        db.execute_unprepared("ALTER TYPE meetings_platform.meeting_status OWNER TO meetings")
            .await?;

        db.execute_unprepared(
            "CREATE TABLE meetings_platform.users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                password VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE meetings_platform.agents (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES meetings_platform.users(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                instructions TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .await?;

        // Agents referenced by a meeting cannot be deleted
        db.execute_unprepared(
            "CREATE TABLE meetings_platform.meetings (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES meetings_platform.users(id) ON DELETE CASCADE,
                agent_id UUID NOT NULL REFERENCES meetings_platform.agents(id) ON DELETE RESTRICT,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                status meetings_platform.meeting_status NOT NULL DEFAULT 'upcoming',
                scheduled_at TIMESTAMPTZ,
                started_at TIMESTAMPTZ,
                ended_at TIMESTAMPTZ,
                transcript_url TEXT,
                summary TEXT,
                user_notes TEXT,
                transcript_entries JSONB,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .await?;

        for table in ["users", "agents", "meetings"] {
            db.execute_unprepared(&format!(
                "ALTER TABLE meetings_platform.{table} OWNER TO meetings"
            ))
            .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("meetings_user_id_created_at")
                    .table((Alias::new("meetings_platform"), Alias::new("meetings")))
                    .col(Alias::new("user_id"))
                    .col((Alias::new("created_at"), IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("meetings_status")
                    .table((Alias::new("meetings_platform"), Alias::new("meetings")))
                    .col(Alias::new("status"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("agents_user_id")
                    .table((Alias::new("meetings_platform"), Alias::new("agents")))
                    .col(Alias::new("user_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS meetings_platform.meetings")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS meetings_platform.agents")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS meetings_platform.users")
            .await?;
        db.execute_unprepared("DROP TYPE IF EXISTS meetings_platform.meeting_status")
            .await?;

        Ok(())
    }
}
