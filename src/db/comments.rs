//! Comments on tasks.

use super::{Database, now_ms};
use crate::types::{Comment, CommentView, Id};
use anyhow::{Result, anyhow};
use rusqlite::{OptionalExtension, Row, params};
use tracing::info;

fn parse_comment_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        author_id: row.get("author_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        media: row.get("media")?,
    })
}

impl Database {
    /// Add a comment to a task. `media` is a path relative to the media root.
    pub fn add_comment(
        &self,
        task_id: Id,
        author_id: Id,
        content: &str,
        media: Option<&str>,
    ) -> Result<Comment> {
        let now = now_ms();

        let comment = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx
                .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![task_id], |_| Ok(true))
                .optional()?
                .unwrap_or(false);
            if !exists {
                return Err(anyhow!("Task not found"));
            }

            tx.execute(
                "INSERT INTO comments (task_id, author_id, content, created_at, media)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![task_id, author_id, content, now, media],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(Comment {
                id,
                task_id,
                author_id,
                content: content.to_string(),
                created_at: now,
                media: media.map(str::to_string),
            })
        })?;

        info!(comment_id = comment.id, task_id, author_id, "comment added");
        Ok(comment)
    }

    /// Get a comment by id.
    pub fn get_comment(&self, comment_id: Id) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let comment = conn
                .query_row(
                    "SELECT * FROM comments WHERE id = ?1",
                    params![comment_id],
                    parse_comment_row,
                )
                .optional()?;
            Ok(comment)
        })
    }

    /// Comments of a task, oldest first, with like counts from the viewer's perspective.
    pub fn list_comments(&self, task_id: Id, viewer_id: Option<Id>) -> Result<Vec<CommentView>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.task_id, c.author_id, c.content, c.created_at, c.media,
                        u.username AS author,
                        (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id) AS like_count,
                        EXISTS (SELECT 1 FROM likes l WHERE l.comment_id = c.id AND l.user_id = ?2) AS liked
                 FROM comments c JOIN users u ON u.id = c.author_id
                 WHERE c.task_id = ?1
                 ORDER BY c.created_at, c.id",
            )?;

            let comments = stmt
                .query_map(params![task_id, viewer_id], |row| {
                    Ok(CommentView {
                        comment: parse_comment_row(row)?,
                        author: row.get("author")?,
                        like_count: row.get("like_count")?,
                        liked: row.get("liked")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(comments)
        })
    }

    /// Replace a comment's text.
    pub fn update_comment(&self, comment_id: Id, content: &str) -> Result<bool> {
        let updated = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                params![content, comment_id],
            )?;
            Ok(n > 0)
        })?;
        if updated {
            info!(comment_id, "comment updated");
        }
        Ok(updated)
    }

    /// Delete a comment; its likes cascade.
    pub fn delete_comment(&self, comment_id: Id) -> Result<bool> {
        let deleted = self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM comments WHERE id = ?1", params![comment_id])?;
            Ok(n > 0)
        })?;
        if deleted {
            info!(comment_id, "comment deleted");
        }
        Ok(deleted)
    }
}
