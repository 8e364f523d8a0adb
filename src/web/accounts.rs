//! Login, logout and registration.

use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;

use super::render::{field_errors, fill, html_escape, page};
use super::{TrackerServer, templates};
use crate::auth::{
    LOGIN_URL, MaybeUser, clear_session_cookie, safe_next, session_cookie, session_token,
};
use crate::db::UsernameTaken;
use crate::error::WebResult;
use crate::types::{FieldErrors, RegistrationForm, User};

#[derive(Debug, Default, Deserialize)]
pub(super) struct NextParams {
    next: Option<String>,
}

/// Form data for logging in.
#[derive(Debug, Default, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    next: Option<String>,
}

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

fn render_login(username: &str, next: &str, error: Option<&str>) -> String {
    let errors = error
        .map(|e| format!(r#"<div class="message message-error">{}</div>"#, html_escape(e)))
        .unwrap_or_default();
    let body = fill(
        templates::LOGIN_TEMPLATE,
        &[
            ("form_errors", &errors),
            ("username", &html_escape(username)),
            ("next", &html_escape(next)),
        ],
    );
    page("Log in", None, "", &body)
}

/// Start a session and redirect with the session cookie set.
fn login_response(state: &TrackerServer, user: &User, location: &str) -> WebResult<Response> {
    let token = state.db().create_session(user.id, state.session_ttl())?;
    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok((
        [(header::SET_COOKIE, session_cookie(&token, state.session_ttl()))],
        Redirect::to(location),
    )
        .into_response())
}

/// Login form. Users who are already logged in go straight to the task list.
pub(super) async fn login_page(
    MaybeUser(user): MaybeUser,
    Query(params): Query<NextParams>,
) -> Response {
    if user.is_some() {
        return Redirect::to(&safe_next(params.next.as_deref())).into_response();
    }
    Html(render_login("", params.next.as_deref().unwrap_or(""), None)).into_response()
}

/// Check credentials and log the user in.
pub(super) async fn login(
    State(state): State<TrackerServer>,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    let username = form.username.trim();
    let next = form.next.as_deref().unwrap_or("");

    match state.db().authenticate(username, &form.password)? {
        Some(user) => login_response(&state, &user, &safe_next(Some(next))),
        None => {
            info!(username = %username, "failed login attempt");
            Ok(Html(render_login(username, next, Some(INVALID_LOGIN))).into_response())
        }
    }
}

/// End the session and return to the login page.
pub(super) async fn logout(State(state): State<TrackerServer>, headers: HeaderMap) -> WebResult<Response> {
    if let Some(token) = session_token(&headers) {
        state.db().delete_session(&token)?;
    }
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to(LOGIN_URL),
    )
        .into_response())
}

fn render_register(username: &str, errors: &FieldErrors) -> String {
    let body = fill(
        templates::REGISTER_TEMPLATE,
        &[
            ("username", &html_escape(username)),
            ("username_errors", &field_errors(errors, "username")),
            ("password1_errors", &field_errors(errors, "password1")),
            ("password2_errors", &field_errors(errors, "password2")),
        ],
    );
    page("Register", None, "", &body)
}

/// Registration form.
pub(super) async fn register_page() -> Html<String> {
    Html(render_register("", &FieldErrors::default()))
}

/// Create an account, log it in and continue to the login page.
pub(super) async fn register(
    State(state): State<TrackerServer>,
    Form(form): Form<RegistrationForm>,
) -> WebResult<Response> {
    let (username, password) = match form.clean() {
        Ok(valid) => valid,
        Err(errors) => return Ok(Html(render_register(&form.username, &errors)).into_response()),
    };

    let user = match state.db().create_user(&username, &password) {
        Ok(user) => user,
        Err(e) => match e.downcast::<UsernameTaken>() {
            Ok(taken) => {
                let mut errors = FieldErrors::default();
                errors.add("username", taken.to_string());
                return Ok(Html(render_register(&username, &errors)).into_response());
            }
            Err(e) => return Err(e.into()),
        },
    };
    info!(user_id = user.id, username = %user.username, "user registered");
    login_response(&state, &user, LOGIN_URL)
}
