use sea_orm::{ActiveModelTrait, ColumnTrait, Value};
use std::collections::HashMap;

/// Copies the values held in `update_map` onto `active_model`, restricted to `allowed` columns.
///
/// Keys that name a column outside `allowed`, or no column at all, are ignored. This is how
/// partial updates are kept from touching lifecycle-owned columns such as `status`.
pub fn apply<A, C>(active_model: &mut A, update_map: &UpdateMap, allowed: &[C])
where
    A: ActiveModelTrait,
    C: ColumnTrait,
    A::Entity: sea_orm::EntityTrait<Column = C>,
{
    for column in allowed {
        if let Some(value) = update_map.get(&column.to_string()) {
            active_model.set(*column, value.clone());
        }
    }
}

/// A map structure that holds column names and their corresponding values for updates.
///
/// A key mapped to `None` means "leave unchanged", which lets callers build the map
/// straight from optional request fields.
#[derive(Default, Debug)]
pub struct UpdateMap {
    map: HashMap<String, Option<Value>>,
}

impl UpdateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key` if one is present and not `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key).and_then(|opt| opt.as_ref())
    }

    pub fn insert(&mut self, key: String, value: Option<Value>) {
        self.map.insert(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.map.values().all(|value| value.is_none())
    }
}

/// A trait that allows types to be converted into an UpdateMap.
pub trait IntoUpdateMap {
    fn into_update_map(self) -> UpdateMap;
}
