//! The identity every user-facing domain operation acts on behalf of.

use crate::{users, Id};

/// An authenticated user, passed explicitly into every lifecycle and agent operation.
///
/// Ownership checks compare records against `user_id`; nothing is read from ambient
/// request state, so operations can be exercised directly in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedCaller {
    user_id: Id,
}

impl AuthenticatedCaller {
    pub fn new(user_id: Id) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Id {
        self.user_id
    }
}

impl From<&users::Model> for AuthenticatedCaller {
    fn from(user: &users::Model) -> Self {
        Self::new(user.id)
    }
}
