use domain::meeting::{self as MeetingApi, ListParams};
use domain::meeting_status::MeetingStatus;
use domain::{IntoUpdateMap, UpdateMap};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    /// Only return meetings in this status
    pub(crate) status: Option<MeetingStatus>,
    /// Page size, 50 by default and at most 100
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl From<IndexParams> for ListParams {
    fn from(params: IndexParams) -> Self {
        Self {
            status: params.status,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// Editable details of an upcoming meeting. Omitted fields keep their current values.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateParams {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    /// RFC 3339 timestamp; anything unparseable clears the schedule
    pub(crate) scheduled_at: Option<String>,
}

impl IntoUpdateMap for UpdateParams {
    fn into_update_map(self) -> UpdateMap {
        MeetingApi::details_update_map(self.name, self.description, self.scheduled_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Value;

    #[test]
    fn omitted_fields_leave_the_update_map_empty() {
        assert!(UpdateParams::default().into_update_map().is_empty());
    }

    #[test]
    fn update_params_accept_camel_case_keys() {
        let params: UpdateParams = serde_json::from_str(
            r#"{"name": "Retro", "scheduledAt": "2026-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        let update_map = params.into_update_map();

        assert_eq!(
            update_map.get("name"),
            Some(&Value::String(Some(Box::new("Retro".to_string()))))
        );
        assert!(update_map.get("scheduled_at").is_some());
        assert!(update_map.get("description").is_none());
    }

    #[test]
    fn status_filter_uses_lowercase_names() {
        let params: IndexParams =
            serde_json::from_str(r#"{"status": "processing", "limit": 10}"#).unwrap();
        let list_params = ListParams::from(params);

        assert_eq!(list_params.status, Some(MeetingStatus::Processing));
        assert_eq!(list_params.limit, Some(10));
        assert_eq!(list_params.offset, None);
    }
}
