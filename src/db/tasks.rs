//! Task CRUD and filtering.

use super::Database;
use crate::types::{Id, Task, TaskFilter, TaskInput, TaskPriority, TaskStatus};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use tracing::info;

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
            t.creator_id, u.username AS creator
     FROM tasks t JOIN users u ON u.id = t.creator_id";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;
    let due_date: Option<String> = row.get("due_date")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        // The CHECK constraints keep these columns within the enums.
        status: status.parse().unwrap_or(TaskStatus::Todo),
        priority: priority.parse().unwrap_or(TaskPriority::Medium),
        due_date: due_date.and_then(|d| chrono::NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
        creator_id: row.get("creator_id")?,
        creator: row.get("creator")?,
    })
}

fn format_due_date(input: &TaskInput) -> Option<String> {
    input.due_date.map(|d| d.format(DATE_FORMAT).to_string())
}

impl Database {
    /// Create a task owned by `creator_id`.
    pub fn create_task(&self, creator_id: Id, input: &TaskInput) -> Result<Task> {
        let task_id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, description, status, priority, due_date, creator_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.title,
                    input.description,
                    input.status.as_str(),
                    input.priority.as_str(),
                    format_due_date(input),
                    creator_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        info!(task_id, creator_id, "task created");
        self.get_task(task_id)?
            .ok_or_else(|| anyhow::anyhow!("task {} vanished after insert", task_id))
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: Id) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!("{} WHERE t.id = ?1", TASK_SELECT),
                    params![task_id],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// List tasks matching the filter, ordered by id.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut conditions = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_string()));
            conditions.push(format!("t.status = ?{}", values.len()));
        }
        if let Some(priority) = filter.priority {
            values.push(Value::Text(priority.as_str().to_string()));
            conditions.push(format!("t.priority = ?{}", values.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("{}{} ORDER BY t.id", TASK_SELECT, where_clause);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(values.iter()), parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Replace the editable fields of a task. Returns false if it does not exist.
    pub fn update_task(&self, task_id: Id, input: &TaskInput) -> Result<bool> {
        let updated = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, status = ?3, priority = ?4, due_date = ?5
                 WHERE id = ?6",
                params![
                    input.title,
                    input.description,
                    input.status.as_str(),
                    input.priority.as_str(),
                    format_due_date(input),
                    task_id,
                ],
            )?;
            Ok(n > 0)
        })?;
        if updated {
            info!(task_id, "task updated");
        }
        Ok(updated)
    }

    /// Set only the status of a task.
    pub fn set_task_status(&self, task_id: Id, status: TaskStatus) -> Result<bool> {
        let updated = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2",
                params![status.as_str(), task_id],
            )?;
            Ok(n > 0)
        })?;
        if updated {
            info!(task_id, status = status.as_str(), "task status changed");
        }
        Ok(updated)
    }

    /// Delete a task; its comments and their likes cascade.
    pub fn delete_task(&self, task_id: Id) -> Result<bool> {
        let deleted = self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(n > 0)
        })?;
        if deleted {
            info!(task_id, "task deleted");
        }
        Ok(deleted)
    }
}
