use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match &self.0.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)) => {
                match entity_error_kind {
                    EntityErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT FOUND"),
                    EntityErrorKind::Invalid => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY")
                    }
                    EntityErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
                    EntityErrorKind::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                    }
                }
            }
            DomainErrorKind::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
            }
            DomainErrorKind::External(ExternalErrorKind::Timeout) => {
                (StatusCode::GATEWAY_TIMEOUT, "GATEWAY TIMEOUT")
            }
            DomainErrorKind::External(_) => (StatusCode::BAD_GATEWAY, "BAD GATEWAY"),
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, fallback) = self.status_and_message();

        // Client errors carry the domain's own message, server errors stay generic
        let message = match &self.0.source {
            Some(source) if status.is_client_error() => source.to_string(),
            _ => fallback.to_string(),
        };

        if status.is_server_error() {
            error!("Request failed with {status}: {}", self.0);
        } else {
            debug!("Request rejected with {status}: {}", self.0);
        }

        (status, message).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(error_kind: DomainErrorKind, message: &str) -> Error {
        Error(DomainError {
            source: Some(message.to_string().into()),
            error_kind,
        })
    }

    fn entity(kind: EntityErrorKind) -> DomainErrorKind {
        DomainErrorKind::Internal(InternalErrorKind::Entity(kind))
    }

    #[test]
    fn entity_kinds_map_to_client_errors() {
        let cases = [
            (entity(EntityErrorKind::NotFound), StatusCode::NOT_FOUND),
            (entity(EntityErrorKind::Invalid), StatusCode::UNPROCESSABLE_ENTITY),
            (entity(EntityErrorKind::Conflict), StatusCode::CONFLICT),
            (entity(EntityErrorKind::Unauthenticated), StatusCode::UNAUTHORIZED),
        ];

        for (kind, expected) in cases {
            assert_eq!(error(kind, "x").into_response().status(), expected);
        }
    }

    #[test]
    fn external_failures_map_to_gateway_errors() {
        let timeout = error(
            DomainErrorKind::External(ExternalErrorKind::Timeout),
            "summary timed out",
        );
        let network = error(
            DomainErrorKind::External(ExternalErrorKind::Network),
            "connection refused",
        );

        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(network.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_failures_map_to_500() {
        let cases = [
            entity(EntityErrorKind::DbTransaction),
            DomainErrorKind::Internal(InternalErrorKind::Config),
            DomainErrorKind::Internal(InternalErrorKind::Other("boom".to_string())),
        ];

        for kind in cases {
            assert_eq!(
                error(kind, "x").into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[tokio::test]
    async fn client_errors_carry_the_domain_message() {
        let err = error(
            entity(EntityErrorKind::Conflict),
            "Cannot start a completed meeting",
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Cannot start a completed meeting");
    }

    #[tokio::test]
    async fn server_errors_hide_their_source() {
        let response = error(
            DomainErrorKind::Internal(InternalErrorKind::Config),
            "missing api secret",
        )
        .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"INTERNAL SERVER ERROR");
    }
}
