//! Session-based authentication.
//!
//! A login creates a row in `sessions` and hands the browser its token in the
//! `sessionid` cookie. Handlers ask for the user with the [`CurrentUser`]
//! extractor (login required) or [`MaybeUser`] (public pages).

pub mod password;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect, Response};
use std::time::Duration;

use crate::error::WebError;
use crate::types::User;
use crate::web::TrackerServer;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// Where unauthenticated users are sent.
pub const LOGIN_URL: &str = "/login";

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value that stores a session token.
pub fn session_cookie(token: &str, max_age: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age.as_secs()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Only local absolute paths are accepted as post-login destinations.
/// Paths with control characters are refused.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(|c| c.is_ascii_control()) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Login URL that returns to `path` afterwards.
pub fn login_redirect_url(path: &str) -> String {
    format!("{}?next={}", LOGIN_URL, urlencoding::encode(path))
}

fn lookup_user(parts: &Parts, state: &TrackerServer) -> Result<Option<User>, WebError> {
    match session_token(&parts.headers) {
        Some(token) => Ok(state.db().get_session_user(&token)?),
        None => Ok(None),
    }
}

/// The logged-in user. Rejects with a redirect to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<TrackerServer> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &TrackerServer,
    ) -> Result<Self, Self::Rejection> {
        match lookup_user(parts, state) {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                let path = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(Redirect::to(&login_redirect_url(path)).into_response())
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

/// The logged-in user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<TrackerServer> for MaybeUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &TrackerServer,
    ) -> Result<Self, Self::Rejection> {
        lookup_user(parts, state)
            .map(MaybeUser)
            .map_err(IntoResponse::into_response)
    }
}
