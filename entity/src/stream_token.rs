use serde::Serialize;
use utoipa::ToSchema;

/// Short-lived credential that lets a browser client join calls on the video platform.
/// Note: This struct does not have a corresponding entity in the database.
#[derive(Serialize, Debug, ToSchema)]
#[schema(as = stream_token::StreamToken)] // OpenAPI schema
pub struct StreamToken {
    pub token: String,
    pub api_key: String,
    pub user_id: String,
    pub user_name: String,
}
