//! Core types for the task tracker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row id used by every table.
pub type Id = i64;

/// Maximum length of a task title.
pub const TITLE_MAX_LEN: usize = 256;

/// Maximum length of a username.
pub const USERNAME_MAX_LEN: usize = 150;

/// Minimum length of a password.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Error returned when parsing an unknown status or priority code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Code stored in the database and submitted by forms.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(UnknownChoice {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(UnknownChoice {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub date_joined: i64,
}

/// A trackable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<chrono::NaiveDate>,
    pub creator_id: Id,
    /// Username of the creator, joined in on read.
    pub creator: String,
}

/// A comment attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: Id,
    pub task_id: Id,
    pub author_id: Id,
    pub content: String,
    pub created_at: i64,
    /// Path relative to the media root, e.g. `comments_media/ab12_photo.png`.
    pub media: Option<String>,
}

/// A comment as shown on the task detail page.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: String,
    pub like_count: i64,
    /// Whether the viewing user has liked this comment.
    pub liked: bool,
}

/// Equality filters for the task list. `None` means "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    /// Build a filter from raw query values. Empty or unknown values are ignored.
    pub fn from_query(status: Option<&str>, priority: Option<&str>) -> Self {
        Self {
            status: status.and_then(|s| s.parse().ok()),
            priority: priority.and_then(|p| p.parse().ok()),
        }
    }
}

/// Validated task fields, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<chrono::NaiveDate>,
}

/// Field-level validation errors collected while cleaning a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<(&'static str, String)>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field, in insertion order.
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

/// Raw task form as submitted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub due_date: String,
}

impl TaskForm {
    /// Prefill the form from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            due_date: task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate the submitted fields.
    pub fn clean(&self) -> Result<TaskInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        } else if title.chars().count() > TITLE_MAX_LEN {
            errors.add(
                "title",
                format!("Ensure this value has at most {} characters.", TITLE_MAX_LEN),
            );
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", "This field is required.");
        }

        let status = if self.status.is_empty() {
            Ok(TaskStatus::default())
        } else {
            self.status.parse::<TaskStatus>()
        };
        let status = status.unwrap_or_else(|e| {
            errors.add("status", format!("Select a valid choice. {} is not one of the available choices.", e.value));
            TaskStatus::default()
        });

        let priority = if self.priority.is_empty() {
            Ok(TaskPriority::default())
        } else {
            self.priority.parse::<TaskPriority>()
        };
        let priority = priority.unwrap_or_else(|e| {
            errors.add("priority", format!("Select a valid choice. {} is not one of the available choices.", e.value));
            TaskPriority::default()
        });

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => match chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("due_date", "Enter a valid date.");
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TaskInput {
            title: title.to_string(),
            description: description.to_string(),
            status,
            priority,
            due_date,
        })
    }
}

/// Raw registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Check a username against the allowed character set and length.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field is required.".to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(format!(
            "Ensure this value has at most {} characters.",
            USERNAME_MAX_LEN
        ));
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

impl RegistrationForm {
    /// Validate everything that does not need the database.
    pub fn clean(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = self.username.trim();

        if let Err(msg) = validate_username(username) {
            errors.add("username", msg);
        }
        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN_LEN
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok((username.to_string(), self.password1.clone()))
    }
}
