use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use super::SessionHolder;
use crate::auth::dto::PublicUser;

/// The signed-in user. Protected routes take this; without a session the
/// request is sent to the login entry point.
pub struct Session(pub PublicUser);

pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionHolder: FromRef<S>,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        SessionHolder::from_ref(state)
            .load(&parts.headers)
            .map(Session)
            .ok_or(LoginRedirect)
    }
}
