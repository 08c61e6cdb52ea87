//! Agents: reusable AI personas owned by a user.

use crate::agents::Model;
use crate::caller::AuthenticatedCaller;
use crate::error::Error;
use crate::Id;
use chrono::Utc;
use entity_api::mutate::UpdateMap;
use log::*;
use sea_orm::{DatabaseConnection, Value};
use serde::Deserialize;
use utoipa::ToSchema;

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 100;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewAgent {
    pub name: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Case-insensitive fragment of the agent name
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub async fn create(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    params: NewAgent,
) -> Result<Model, Error> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(Error::invalid("Agent name is required"));
    }
    let instructions = params.instructions.trim();
    if instructions.is_empty() {
        return Err(Error::invalid("Agent instructions are required"));
    }

    let now = Utc::now();
    let agent = entity_api::agent::create(
        db,
        Model {
            id: Id::new_v4(),
            user_id: caller.user_id(),
            name: name.to_string(),
            instructions: instructions.to_string(),
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    info!("Agent {} created", agent.id);
    Ok(agent)
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    id: Id,
) -> Result<Model, Error> {
    Ok(entity_api::agent::find_by_id_and_user(db, id, caller.user_id()).await?)
}

pub async fn list(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    params: ListParams,
) -> Result<Vec<Model>, Error> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    Ok(entity_api::agent::find_by_user(
        db,
        caller.user_id(),
        params.search.as_deref(),
        limit,
        params.offset.unwrap_or(0),
    )
    .await?)
}

pub async fn update(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    id: Id,
    update_map: UpdateMap,
) -> Result<Model, Error> {
    for field in ["name", "instructions"] {
        if let Some(Value::String(Some(value))) = update_map.get(field) {
            if value.trim().is_empty() {
                return Err(Error::invalid(format!("Agent {field} cannot be empty")));
            }
        }
    }

    let agent = find_by_id(db, caller, id).await?;
    if update_map.is_empty() {
        return Ok(agent);
    }

    Ok(entity_api::agent::update(db, agent, update_map).await?)
}

/// Deletes an agent. An agent still bound to meetings cannot be deleted, since every
/// meeting keeps the agent it was created with.
pub async fn delete(
    db: &DatabaseConnection,
    caller: AuthenticatedCaller,
    id: Id,
) -> Result<(), Error> {
    let agent = find_by_id(db, caller, id).await?;

    let meeting_count = entity_api::meeting::count_by_agent(db, agent.id).await?;
    if meeting_count > 0 {
        return Err(Error::conflict(format!(
            "Agent {id} is used by {meeting_count} meeting(s)"
        )));
    }

    entity_api::agent::delete(db, id, caller.user_id()).await?;
    info!("Agent {id} deleted");
    Ok(())
}
