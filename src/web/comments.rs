//! Comment handlers: create (with upload), edit, delete, like toggle.

use axum::{
    extract::{Form, Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::warn;

use super::extract::IdPath;
use super::render::{field_errors, fill, html_escape, page, with_error_message};
use super::tasks::load_task;
use super::{TrackerServer, templates};
use crate::auth::CurrentUser;
use crate::error::{WebError, WebResult};
use crate::permissions::ensure_comment_author;
use crate::types::{Comment, FieldErrors, Id, User};

/// Form data for editing a comment.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CommentForm {
    #[serde(default)]
    content: String,
}

fn task_url(task_id: Id) -> String {
    format!("/tasks/{}", task_id)
}

fn load_comment(state: &TrackerServer, comment_id: Id) -> WebResult<Comment> {
    state
        .db()
        .get_comment(comment_id)?
        .ok_or_else(|| WebError::comment_not_found(comment_id))
}

/// An uploaded file pulled out of the multipart body.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Add a comment to a task. Accepts `multipart/form-data` with `content` and an optional `media` file.
pub(super) async fn comment_create(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(task_id): IdPath,
    mut multipart: Multipart,
) -> WebResult<Redirect> {
    let task = load_task(&state, task_id)?;

    let mut content = String::new();
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::bad_request(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") => {
                content = field
                    .text()
                    .await
                    .map_err(|e| WebError::bad_request(e.body_text()))?;
            }
            Some("media") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::bad_request(e.body_text()))?;
                // Browsers send an empty part when no file was chosen.
                if !filename.is_empty() && !bytes.is_empty() {
                    upload = Some(Upload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let content = content.trim();
    if content.is_empty() {
        return Ok(Redirect::to(&with_error_message(
            &task_url(task.id),
            "A comment cannot be empty.",
        )));
    }

    let media = match upload {
        Some(upload) => Some(state.media().save(&upload.filename, &upload.bytes)?),
        None => None,
    };

    if let Err(e) = state
        .db()
        .add_comment(task.id, user.id, content, media.as_deref())
    {
        if let Some(path) = media.as_deref() {
            let _ = state.media().remove(path);
        }
        return Err(e.into());
    }

    Ok(Redirect::to(&task_url(task.id)))
}

fn render_edit_form(comment: &Comment, content: &str, errors: &FieldErrors, user: &User) -> String {
    let body = fill(
        templates::COMMENT_EDIT_TEMPLATE,
        &[
            ("comment_id", &comment.id.to_string()),
            ("task_id", &comment.task_id.to_string()),
            ("content", &html_escape(content)),
            ("content_errors", &field_errors(errors, "content")),
        ],
    );
    page("Edit comment", Some(user), "", &body)
}

/// Edit form; only the author may open it.
pub(super) async fn comment_edit_page(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(comment_id): IdPath,
) -> WebResult<Html<String>> {
    let comment = load_comment(&state, comment_id)?;
    ensure_comment_author(&comment, &user)?;
    Ok(Html(render_edit_form(
        &comment,
        &comment.content,
        &FieldErrors::default(),
        &user,
    )))
}

/// Save an edited comment; non-authors get 403.
pub(super) async fn comment_edit(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(comment_id): IdPath,
    Form(form): Form<CommentForm>,
) -> WebResult<Response> {
    let comment = load_comment(&state, comment_id)?;
    ensure_comment_author(&comment, &user)?;

    let content = form.content.trim();
    if content.is_empty() {
        let mut errors = FieldErrors::default();
        errors.add("content", "This field is required.");
        return Ok(Html(render_edit_form(&comment, &form.content, &errors, &user)).into_response());
    }

    state.db().update_comment(comment.id, content)?;
    Ok(Redirect::to(&task_url(comment.task_id)).into_response())
}

const NOT_YOUR_COMMENT: &str = "You cannot delete other users' comments.";

/// Delete confirmation. Non-authors are sent back to the task with a message.
pub(super) async fn comment_delete_page(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(comment_id): IdPath,
) -> WebResult<Response> {
    let comment = load_comment(&state, comment_id)?;
    if ensure_comment_author(&comment, &user).is_err() {
        return Ok(
            Redirect::to(&with_error_message(&task_url(comment.task_id), NOT_YOUR_COMMENT))
                .into_response(),
        );
    }

    let body = fill(
        templates::COMMENT_DELETE_TEMPLATE,
        &[
            ("comment_id", &comment.id.to_string()),
            ("task_id", &comment.task_id.to_string()),
            ("content", &html_escape(&comment.content)),
        ],
    );
    Ok(Html(page("Delete comment", Some(&user), "", &body)).into_response())
}

/// Delete a comment and its uploaded file. Non-authors are redirected with a message.
pub(super) async fn comment_delete(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(comment_id): IdPath,
) -> WebResult<Redirect> {
    let comment = load_comment(&state, comment_id)?;
    let back = task_url(comment.task_id);

    if ensure_comment_author(&comment, &user).is_err() {
        warn!(comment_id, user_id = user.id, "refused comment deletion by non-author");
        return Ok(Redirect::to(&with_error_message(&back, NOT_YOUR_COMMENT)));
    }

    state.db().delete_comment(comment.id)?;
    if let Some(path) = comment.media.as_deref() {
        if let Err(e) = state.media().remove(path) {
            warn!(comment_id, path = %path, error = %e, "failed to remove media file");
        }
    }

    Ok(Redirect::to(&back))
}

/// Like or unlike a comment.
pub(super) async fn comment_like_toggle(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(comment_id): IdPath,
) -> WebResult<Redirect> {
    let comment = load_comment(&state, comment_id)?;
    state.db().toggle_like(comment.id, user.id)?;
    Ok(Redirect::to(&task_url(comment.task_id)))
}
