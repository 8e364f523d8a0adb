//! Likes on comments, unique per (comment, user).

use super::{Database, now_ms};
use crate::types::Id;
use anyhow::Result;
use rusqlite::params;
use tracing::info;

impl Database {
    /// Like the comment if the user has not, otherwise remove the like.
    /// Returns whether the comment is liked by the user afterwards.
    pub fn toggle_like(&self, comment_id: Id, user_id: Id) -> Result<bool> {
        let now = now_ms();

        let liked = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let removed = tx.execute(
                "DELETE FROM likes WHERE comment_id = ?1 AND user_id = ?2",
                params![comment_id, user_id],
            )?;
            if removed == 0 {
                tx.execute(
                    "INSERT INTO likes (comment_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                    params![comment_id, user_id, now],
                )?;
            }

            tx.commit()?;
            Ok(removed == 0)
        })?;

        info!(comment_id, user_id, liked, "like toggled");
        Ok(liked)
    }

    /// Number of likes on a comment.
    pub fn like_count(&self, comment_id: Id) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE comment_id = ?1",
                params![comment_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Whether the user has liked the comment.
    pub fn has_liked(&self, comment_id: Id, user_id: Id) -> Result<bool> {
        self.with_conn(|conn| {
            let liked = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM likes WHERE comment_id = ?1 AND user_id = ?2)",
                params![comment_id, user_id],
                |row| row.get(0),
            )?;
            Ok(liked)
        })
    }
}
