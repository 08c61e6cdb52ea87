//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use meeting_auth::error::{
    Error as MeetingAuthError, ErrorKind as MeetingAuthErrorKind, HttpErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. `web` depends on `domain` but never directly on `entity_api`, so
/// every lower-layer error is translated here and `web` maps the resulting kinds to
/// HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    Other(String),
}

/// Entity errors reduced to the subset that matters to callers of the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    Unauthenticated,
    /// The record is not in a state that allows the requested change.
    Conflict,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Timeout,
    Other(String),
}

impl Error {
    pub(crate) fn entity(kind: EntityErrorKind, message: impl Into<String>) -> Self {
        Error {
            source: Some(message.into().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(kind)),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::entity(EntityErrorKind::Invalid, message)
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::entity(EntityErrorKind::Conflict, message)
    }

    /// Rejected credentials. The message is shown to the client as is.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::entity(EntityErrorKind::Unauthenticated, message)
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error {
            source: Some(message.into().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        Error {
            source: Some(message.into().into()),
            error_kind: DomainErrorKind::External(ExternalErrorKind::Timeout),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error: {:?}: {source}", self.error_kind),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::InvalidQueryTerm | EntityApiErrorKind::ValidationError => {
                EntityErrorKind::Invalid
            }
            EntityApiErrorKind::RecordUnauthenticated => EntityErrorKind::Unauthenticated,
            EntityApiErrorKind::RecordConflict | EntityApiErrorKind::RecordNotUpdated => {
                EntityErrorKind::Conflict
            }
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            EntityApiErrorKind::Other => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<meeting_ai::Error> for Error {
    fn from(err: meeting_ai::Error) -> Self {
        use meeting_ai::Error as AiError;

        let error_kind = match &err {
            AiError::Network(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            AiError::Timeout(_) => DomainErrorKind::External(ExternalErrorKind::Timeout),
            AiError::Configuration(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            other => DomainErrorKind::External(ExternalErrorKind::Other(other.to_string())),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<MeetingAuthError> for Error {
    fn from(err: MeetingAuthError) -> Self {
        let error_kind = match &err.error_kind {
            MeetingAuthErrorKind::Http(HttpErrorKind::Timeout) => {
                DomainErrorKind::External(ExternalErrorKind::Timeout)
            }
            MeetingAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            MeetingAuthErrorKind::ApiKey(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            MeetingAuthErrorKind::Webhook(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ExternalErrorKind::Timeout
        } else {
            ExternalErrorKind::Network
        };
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::External(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_api_error(kind: EntityApiErrorKind) -> EntityApiError {
        EntityApiError {
            source: None,
            error_kind: kind,
        }
    }

    #[test]
    fn conflicting_writes_map_to_conflict() {
        for kind in [
            EntityApiErrorKind::RecordConflict,
            EntityApiErrorKind::RecordNotUpdated,
        ] {
            let err = Error::from(entity_api_error(kind));
            assert_eq!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
            );
        }
    }

    #[test]
    fn validation_and_bad_ids_map_to_invalid() {
        for kind in [
            EntityApiErrorKind::ValidationError,
            EntityApiErrorKind::InvalidQueryTerm,
        ] {
            let err = Error::from(entity_api_error(kind));
            assert_eq!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
            );
        }
    }

    #[test]
    fn provider_timeouts_stay_distinguishable() {
        let err = Error::from(meeting_ai::Error::Timeout("summary".to_string()));
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Timeout)
        );

        let err = Error::from(meeting_ai::Error::Configuration("no key".to_string()));
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }
}
