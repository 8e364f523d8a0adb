//! HTML templates for the web pages.
//!
//! Templates are embedded at compile time using `include_str!` and filled in
//! by [`super::render::fill`].

/// Page layout with navigation and flash message slot.
pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");

/// Task list with status/priority filter form.
pub const TASK_LIST_TEMPLATE: &str = include_str!("templates/task_list.html");

/// Task detail with comments and the comment form.
pub const TASK_DETAIL_TEMPLATE: &str = include_str!("templates/task_detail.html");

/// Create/update task form.
pub const TASK_FORM_TEMPLATE: &str = include_str!("templates/task_form.html");

pub const TASK_DELETE_TEMPLATE: &str = include_str!("templates/task_delete.html");

pub const COMMENT_EDIT_TEMPLATE: &str = include_str!("templates/comment_edit.html");

pub const COMMENT_DELETE_TEMPLATE: &str = include_str!("templates/comment_delete.html");

pub const LOGIN_TEMPLATE: &str = include_str!("templates/login.html");

pub const REGISTER_TEMPLATE: &str = include_str!("templates/register.html");

/// Body of 4xx/5xx pages.
pub const ERROR_TEMPLATE: &str = include_str!("templates/error.html");
