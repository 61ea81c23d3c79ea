//! Request gate: turns the session cookie into an identity.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    PrivateCookieJar,
};

use crate::{
    error::AppError,
    models::{session::Session, user::UserId},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let Some(token) = session_token(&jar) else {
            return Ok(Self(None));
        };

        let Some(user_id) = state.sessions.validate(&token).await? else {
            return Ok(Self(None));
        };

        // A missing user row resolves to anonymous.
        let user = state.credentials.find_user(user_id).await?;
        Ok(Self(user.map(|user| AuthenticatedUser {
            id: user.id,
            username: user.username,
        })))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session: &Session) -> PrivateCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, session.session_id.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// The raw session id carried by the request, if any.
pub fn session_token(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned())
}
