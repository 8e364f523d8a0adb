//! Task pages: list, detail, create, update, status change, delete.

use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::extract::IdPath;
use super::render::{
    field_errors, flash_message, format_timestamp, html_escape, linebreaks, page, select_options,
};
use super::{TrackerServer, templates};
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::{WebError, WebResult};
use crate::media::{MediaKind, MediaStore};
use crate::permissions::ensure_task_owner;
use crate::types::{
    CommentView, FieldErrors, Id, Task, TaskFilter, TaskForm, TaskPriority, TaskStatus, User,
};

/// Query parameters for the task list.
#[derive(Debug, Default, Deserialize)]
pub(super) struct TaskListParams {
    status: Option<String>,
    priority: Option<String>,
    msg: Option<String>,
}

/// Query parameters carrying a flash message.
#[derive(Debug, Default, Deserialize)]
pub(super) struct MessageParams {
    msg: Option<String>,
}

/// Form data for the status-change endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct StatusForm {
    task_status: Option<String>,
}

fn status_options(selected: Option<&str>) -> String {
    select_options(TaskStatus::ALL.iter().map(|s| (s.as_str(), s.label())), selected)
}

fn priority_options(selected: Option<&str>) -> String {
    select_options(TaskPriority::ALL.iter().map(|p| (p.as_str(), p.label())), selected)
}

fn format_due_date(task: &Task) -> String {
    task.due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Fetch a task or fail with 404.
pub(super) fn load_task(state: &TrackerServer, task_id: Id) -> WebResult<Task> {
    state
        .db()
        .get_task(task_id)?
        .ok_or_else(|| WebError::task_not_found(task_id))
}

/// Fetch a task the user owns; other users get 403.
fn load_owned_task(state: &TrackerServer, task_id: Id, user: &User) -> WebResult<Task> {
    let task = load_task(state, task_id)?;
    ensure_task_owner(&task, user)?;
    Ok(task)
}

fn render_task_row(task: &Task, user: Option<&User>) -> String {
    let owner_controls = match user {
        Some(user) if user.id == task.creator_id => format!(
            r#"<form class="inline" method="post" action="/tasks/{id}/status">
                <select name="task_status">{options}</select>
                <button type="submit">Set</button>
            </form>
            <a href="/tasks/{id}/update">Edit</a>
            <a href="/tasks/{id}/delete">Delete</a>"#,
            id = task.id,
            options = status_options(Some(task.status.as_str())),
        ),
        _ => String::new(),
    };

    format!(
        r#"<tr>
            <td><a href="/tasks/{id}">{title}</a></td>
            <td><span class="badge badge-{status}">{status_label}</span></td>
            <td><span class="badge badge-{priority}">{priority_label}</span></td>
            <td>{due}</td>
            <td>{creator}</td>
            <td>{owner_controls}</td>
        </tr>"#,
        id = task.id,
        title = html_escape(&task.title),
        status = task.status.as_str(),
        status_label = task.status.label(),
        priority = task.priority.as_str(),
        priority_label = task.priority.label(),
        due = format_due_date(task),
        creator = html_escape(&task.creator),
        owner_controls = owner_controls,
    )
}

/// Task list, filterable by status and priority. Unknown filter values are ignored.
pub(super) async fn task_list(
    State(state): State<TrackerServer>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<TaskListParams>,
) -> WebResult<Html<String>> {
    let filter = TaskFilter::from_query(params.status.as_deref(), params.priority.as_deref());
    let tasks = state.db().list_tasks(&filter)?;

    let tasks_html = if tasks.is_empty() {
        r#"<div class="empty-state">No tasks found</div>"#.to_string()
    } else {
        let rows: String = tasks
            .iter()
            .map(|task| render_task_row(task, user.as_ref()))
            .collect();
        format!(
            "<table><thead><tr><th>Task</th><th>Status</th><th>Priority</th><th>Due</th><th>Creator</th><th></th></tr></thead><tbody>{}</tbody></table>",
            rows
        )
    };

    let content = super::render::fill(
        templates::TASK_LIST_TEMPLATE,
        &[
            ("status_options", &status_options(filter.status.map(TaskStatus::as_str))),
            (
                "priority_options",
                &priority_options(filter.priority.map(TaskPriority::as_str)),
            ),
            ("tasks", &tasks_html),
        ],
    );

    Ok(Html(page(
        "Tasks",
        user.as_ref(),
        &flash_message(params.msg.as_deref()),
        &content,
    )))
}

fn render_comment(view: &CommentView, user: &User) -> String {
    let comment = &view.comment;

    let media_html = match comment.media.as_deref() {
        Some(path) => {
            let url = html_escape(&MediaStore::url(path));
            match MediaKind::from_path(path) {
                MediaKind::Image => format!(
                    r#"<div class="comment-media"><img src="{}" alt="attachment"></div>"#,
                    url
                ),
                MediaKind::Video => format!(
                    r#"<div class="comment-media"><video src="{}" controls></video></div>"#,
                    url
                ),
                MediaKind::Other => format!(
                    r#"<div class="comment-media"><a href="{}">Download attachment</a></div>"#,
                    url
                ),
            }
        }
        None => String::new(),
    };

    let author_actions = if comment.author_id == user.id {
        format!(
            r#"<a href="/comments/{id}/edit">Edit</a> <a href="/comments/{id}/delete">Delete</a>"#,
            id = comment.id
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="comment" id="comment-{id}">
            <p class="muted">{author} &middot; {created}</p>
            <p>{content}</p>
            {media}
            <form class="inline" method="post" action="/comments/{id}/like">
                <button type="submit">{like_label}</button>
            </form>
            <span class="muted">{likes} like(s)</span>
            {actions}
        </div>"#,
        id = comment.id,
        author = html_escape(&view.author),
        created = format_timestamp(comment.created_at),
        content = linebreaks(&comment.content),
        media = media_html,
        like_label = if view.liked { "Unlike" } else { "Like" },
        likes = view.like_count,
        actions = author_actions,
    )
}

/// Task detail page with comments.
pub(super) async fn task_detail(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(task_id): IdPath,
    Query(params): Query<MessageParams>,
) -> WebResult<Html<String>> {
    let task = load_task(&state, task_id)?;
    let comments = state.db().list_comments(task_id, Some(user.id))?;

    let comments_html = if comments.is_empty() {
        r#"<div class="empty-state">No comments yet</div>"#.to_string()
    } else {
        comments
            .iter()
            .map(|c| render_comment(c, &user))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let owner_actions = if task.creator_id == user.id {
        format!(
            r#"<p><a href="/tasks/{id}/update">Edit</a> <a href="/tasks/{id}/delete">Delete</a></p>"#,
            id = task.id
        )
    } else {
        String::new()
    };

    let content = super::render::fill(
        templates::TASK_DETAIL_TEMPLATE,
        &[
            ("task_id", &task.id.to_string()),
            ("task_title", &html_escape(&task.title)),
            ("task_status", task.status.as_str()),
            ("task_status_label", task.status.label()),
            ("task_priority", task.priority.as_str()),
            ("task_priority_label", task.priority.label()),
            ("task_due_date", &format_due_date(&task)),
            ("task_creator", &html_escape(&task.creator)),
            ("task_description", &linebreaks(&task.description)),
            ("owner_actions", &owner_actions),
            ("comments", &comments_html),
        ],
    );

    Ok(Html(page(
        &task.title,
        Some(&user),
        &flash_message(params.msg.as_deref()),
        &content,
    )))
}

struct TaskFormPage<'a> {
    heading: &'a str,
    action: String,
    submit_label: &'a str,
    cancel_url: String,
}

fn render_task_form(meta: &TaskFormPage<'_>, form: &TaskForm, errors: &FieldErrors, user: &User) -> String {
    let selected_status = Some(form.status.as_str()).filter(|s| !s.is_empty());
    let selected_priority = Some(form.priority.as_str()).filter(|p| !p.is_empty());

    let content = super::render::fill(
        templates::TASK_FORM_TEMPLATE,
        &[
            ("heading", meta.heading),
            ("action", &meta.action),
            ("submit_label", meta.submit_label),
            ("cancel_url", &meta.cancel_url),
            ("title", &html_escape(&form.title)),
            ("title_errors", &field_errors(errors, "title")),
            ("description", &html_escape(&form.description)),
            ("description_errors", &field_errors(errors, "description")),
            (
                "status_options",
                &status_options(selected_status.or(Some(TaskStatus::default().as_str()))),
            ),
            ("status_errors", &field_errors(errors, "status")),
            (
                "priority_options",
                &priority_options(selected_priority.or(Some(TaskPriority::default().as_str()))),
            ),
            ("priority_errors", &field_errors(errors, "priority")),
            ("due_date", &html_escape(&form.due_date)),
            ("due_date_errors", &field_errors(errors, "due_date")),
        ],
    );
    page(meta.heading, Some(user), "", &content)
}

fn create_form_page() -> TaskFormPage<'static> {
    TaskFormPage {
        heading: "New task",
        action: "/tasks/new".to_string(),
        submit_label: "Create",
        cancel_url: "/".to_string(),
    }
}

fn update_form_page(task_id: Id) -> TaskFormPage<'static> {
    TaskFormPage {
        heading: "Edit task",
        action: format!("/tasks/{}/update", task_id),
        submit_label: "Save",
        cancel_url: format!("/tasks/{}", task_id),
    }
}

/// Blank task form.
pub(super) async fn task_create_page(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(render_task_form(
        &create_form_page(),
        &TaskForm::default(),
        &FieldErrors::default(),
        &user,
    ))
}

/// Create a task owned by the requester.
pub(super) async fn task_create(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<TaskForm>,
) -> WebResult<Response> {
    match form.clean() {
        Ok(input) => {
            state.db().create_task(user.id, &input)?;
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => Ok(Html(render_task_form(&create_form_page(), &form, &errors, &user)).into_response()),
    }
}

/// Change a task's status. Values outside the status enum leave the task untouched.
pub(super) async fn task_change_status(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(task_id): IdPath,
    Form(form): Form<StatusForm>,
) -> WebResult<Redirect> {
    let task = load_owned_task(&state, task_id, &user)?;

    match form.task_status.as_deref().map(str::parse::<TaskStatus>) {
        Some(Ok(status)) => {
            state.db().set_task_status(task.id, status)?;
        }
        Some(Err(e)) => tracing::debug!(task_id, error = %e, "ignoring invalid status"),
        None => tracing::debug!(task_id, "status change without a value"),
    }

    Ok(Redirect::to("/"))
}

/// Edit form prefilled from the task.
pub(super) async fn task_update_page(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(task_id): IdPath,
) -> WebResult<Html<String>> {
    let task = load_owned_task(&state, task_id, &user)?;
    Ok(Html(render_task_form(
        &update_form_page(task.id),
        &TaskForm::from_task(&task),
        &FieldErrors::default(),
        &user,
    )))
}

/// Save task edits.
pub(super) async fn task_update(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(task_id): IdPath,
    Form(form): Form<TaskForm>,
) -> WebResult<Response> {
    let task = load_owned_task(&state, task_id, &user)?;

    match form.clean() {
        Ok(input) => {
            state.db().update_task(task.id, &input)?;
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => Ok(Html(render_task_form(
            &update_form_page(task.id),
            &form,
            &errors,
            &user,
        ))
        .into_response()),
    }
}

/// Delete confirmation page.
pub(super) async fn task_delete_page(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(task_id): IdPath,
) -> WebResult<Html<String>> {
    let task = load_owned_task(&state, task_id, &user)?;
    let content = super::render::fill(
        templates::TASK_DELETE_TEMPLATE,
        &[
            ("task_id", &task.id.to_string()),
            ("task_title", &html_escape(&task.title)),
        ],
    );
    Ok(Html(page("Delete task", Some(&user), "", &content)))
}

/// Delete the task together with its comments, likes and uploaded files.
pub(super) async fn task_delete(
    State(state): State<TrackerServer>,
    CurrentUser(user): CurrentUser,
    IdPath(task_id): IdPath,
) -> WebResult<Redirect> {
    let task = load_owned_task(&state, task_id, &user)?;

    let media: Vec<String> = state
        .db()
        .list_comments(task.id, None)?
        .into_iter()
        .filter_map(|view| view.comment.media)
        .collect();

    state.db().delete_task(task.id)?;

    for path in media {
        if let Err(e) = state.media().remove(&path) {
            tracing::warn!(task_id, path = %path, error = %e, "failed to remove media file");
        }
    }

    Ok(Redirect::to("/"))
}
