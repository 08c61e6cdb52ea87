use domain::agent::ListParams;
use domain::{IntoUpdateMap, UpdateMap};
use sea_orm::Value;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    /// Case-insensitive match against the agent name
    pub(crate) search: Option<String>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl From<IndexParams> for ListParams {
    fn from(params: IndexParams) -> Self {
        Self {
            search: params.search,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct UpdateParams {
    pub(crate) name: Option<String>,
    pub(crate) instructions: Option<String>,
}

impl IntoUpdateMap for UpdateParams {
    fn into_update_map(self) -> UpdateMap {
        let mut update_map = UpdateMap::new();
        update_map.insert(
            "name".to_string(),
            self.name.map(|name| Value::String(Some(Box::new(name)))),
        );
        update_map.insert(
            "instructions".to_string(),
            self.instructions
                .map(|instructions| Value::String(Some(Box::new(instructions)))),
        );
        update_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_supplied_fields_are_updated() {
        let update_map = UpdateParams {
            name: None,
            instructions: Some("Keep it short.".to_string()),
        }
        .into_update_map();

        assert!(update_map.get("name").is_none());
        assert_eq!(
            update_map.get("instructions"),
            Some(&Value::String(Some(Box::new("Keep it short.".to_string()))))
        );
    }
}
