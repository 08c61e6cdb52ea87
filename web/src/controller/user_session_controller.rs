use crate::controller::ApiResponse;
use crate::error::{Error as WebError, Result as WebResult};
use axum::{http::StatusCode, response::IntoResponse, Form, Json};
use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use domain::user::{AuthSession, Credentials};
use log::*;
use serde::Serialize;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// The identity returned to the browser after login. The password hash never leaves
/// the server.
#[derive(Debug, Serialize)]
struct SessionUser {
    id: domain::Id,
    email: String,
    name: String,
}

impl From<domain::users::Model> for SessionUser {
    fn from(user: domain::users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Logs the user into the meetings platform and returns a new session cookie.
///
/// set-cookie: id=07bbbe54-bd35-425f-8e63-618a8d8612df; HttpOnly; SameSite=Strict; Path=/; Max-Age=86399
///
/// The cookie must accompany every later API call, e.g.:
/// curl -v --header "Cookie: id=07bbbe54-bd35-425f-8e63-618a8d8612df" --header "x-version: 1.0.0" http://localhost:4000/meetings
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = domain::user::Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logs in and returns session authentication cookie"),
        (status = 401, description = "Invalid email or password"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn login(
    mut auth_session: AuthSession,
    Form(creds): Form<Credentials>,
) -> WebResult<impl IntoResponse> {
    // Unknown emails and wrong passwords look the same to the client
    let user = match auth_session.authenticate(creds.clone()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!("Rejected login for {:?}", creds.email);
            return Err(DomainError::unauthenticated(INVALID_CREDENTIALS).into());
        }
        Err(auth_error) => {
            warn!("Login for {:?} failed: {auth_error:?}", creds.email);
            return Err(DomainError::unauthenticated(INVALID_CREDENTIALS).into());
        }
    };

    if let Err(login_error) = auth_session.login(&user).await {
        error!("Could not store the session for user {}: {login_error:?}", user.id);
        return Err(WebError::from(DomainError {
            source: Some(Box::new(login_error)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Session login failed".to_string(),
            )),
        }));
    }

    debug!("User {} logged in", user.id);

    Ok(Json(ApiResponse::ok(SessionUser::from(user))))
}

/// Logs the user out by destroying their session.
#[utoipa::path(
    get,
    path = "/delete",
    responses(
        (status = 200, description = "Successfully logged out"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(mut auth_session: AuthSession) -> impl IntoResponse {
    match auth_session.logout().await {
        Ok(Some(user)) => {
            debug!("User {} logged out", user.id);
            StatusCode::OK.into_response()
        }
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("Could not destroy session: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
