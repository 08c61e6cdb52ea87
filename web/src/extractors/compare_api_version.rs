use crate::extractors::RejectionType;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use log::*;
use service::config::ApiVersion;

/// Rejects requests whose `x-version` header names an API version this server does not serve.
pub(crate) struct CompareApiVersion(pub String);

impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let version = parts
            .headers
            .get(ApiVersion::field_name())
            .and_then(|value| value.to_str().ok())
            .map(str::trim);

        match version {
            Some(version) if ApiVersion::versions().contains(&version) => {
                Ok(CompareApiVersion(version.to_string()))
            }
            Some(version) => {
                debug!("Rejecting request for unsupported API version {version}");
                Err((
                    StatusCode::BAD_REQUEST,
                    format!(
                        "Unsupported API version {version}, expected one of {:?}",
                        ApiVersion::versions()
                    ),
                ))
            }
            None => Err((
                StatusCode::BAD_REQUEST,
                format!("Missing {} header", ApiVersion::field_name()),
            )),
        }
    }
}
