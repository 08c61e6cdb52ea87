//! Store operations for the agents table.

use super::error::Error;
use crate::mutate::{self, UpdateMap};
use chrono::Utc;
use entity::agents::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    sea_query::{Expr, Func},
    ActiveValue::Set,
    ConnectionTrait, IntoActiveModel, QueryOrder, QuerySelect,
};

/// Columns an agent owner may edit.
pub const EDITABLE_COLUMNS: [Column; 2] = [Column::Name, Column::Instructions];

pub async fn create(db: &impl ConnectionTrait, agent_model: Model) -> Result<Model, Error> {
    debug!("New Agent Model to be inserted: {agent_model:?}");

    let now = Utc::now();
    let agent_active_model: ActiveModel = ActiveModel {
        user_id: Set(agent_model.user_id),
        name: Set(agent_model.name),
        instructions: Set(agent_model.instructions),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(agent_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Finds an agent owned by `user_id`. An agent owned by someone else is reported as
/// not found.
pub async fn find_by_id_and_user(
    db: &impl ConnectionTrait,
    id: Id,
    user_id: Id,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            debug!("Agent {id} not found for user {user_id}");
            Error::not_found()
        })
}

/// Lists a user's agents, newest first, optionally filtered by a case-insensitive
/// name fragment.
pub async fn find_by_user(
    db: &impl ConnectionTrait,
    user_id: Id,
    search: Option<&str>,
    limit: u64,
    offset: u64,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find().filter(Column::UserId.eq(user_id));

    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Expr::expr(Func::lower(Expr::col(Column::Name)))
                .like(format!("%{}%", search.to_lowercase())),
        );
    }

    Ok(query
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?)
}

/// Applies the editable fields in `update_map` to an existing agent. Fields absent from
/// the map keep their stored values.
pub async fn update(
    db: &impl ConnectionTrait,
    agent: Model,
    update_map: UpdateMap,
) -> Result<Model, Error> {
    let mut active_model = agent.into_active_model();
    mutate::apply(&mut active_model, &update_map, &EDITABLE_COLUMNS);
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub async fn delete(db: &impl ConnectionTrait, id: Id, user_id: Id) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }

    Ok(())
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn agent_model() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            name: "Interview coach".to_string(),
            instructions: "Ask one question at a time.".to_string(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn update_keeps_instructions_when_only_name_changes() -> Result<(), Error> {
        let agent = agent_model();
        let renamed = Model {
            name: "Renamed".to_string(),
            ..agent.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[renamed.clone()]])
            .into_connection();

        let mut update_map = UpdateMap::new();
        update_map.insert("name".to_string(), Some("Renamed".into()));
        update_map.insert("instructions".to_string(), None);

        let updated = update(&db, agent.clone(), update_map).await?;

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.instructions, agent.instructions);
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_not_found_when_nothing_matched() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = delete(&db, Id::new_v4(), Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }
}
