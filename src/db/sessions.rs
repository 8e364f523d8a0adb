//! Login sessions referenced by the session cookie.

use super::{Database, now_ms};
use crate::types::{Id, User};
use anyhow::Result;
use rusqlite::{OptionalExtension, params};
use std::time::Duration;
use uuid::Uuid;

impl Database {
    /// Start a session for the user and return its token.
    pub fn create_session(&self, user_id: Id, ttl: Duration) -> Result<String> {
        let token = Uuid::new_v4().simple().to_string();
        let now = now_ms();
        let expires_at = now.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX));

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                params![token, user_id, now, expires_at],
            )?;
            Ok(())
        })?;

        Ok(token)
    }

    /// Resolve a session token to its user. Expired or unknown tokens yield `None`.
    pub fn get_session_user(&self, token: &str) -> Result<Option<User>> {
        let now = now_ms();
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT u.id, u.username, u.password_hash, u.date_joined
                     FROM sessions s JOIN users u ON u.id = s.user_id
                     WHERE s.token = ?1 AND s.expires_at > ?2",
                    params![token, now],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            password_hash: row.get(2)?,
                            date_joined: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(user)
        })
    }

    /// End a session.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
            Ok(())
        })
    }

    /// Remove every expired session. Returns the number removed.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let now = now_ms();
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
            Ok(n)
        })
    }
}
