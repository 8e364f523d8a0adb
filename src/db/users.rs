//! User accounts.

use super::{Database, now_ms};
use crate::auth::password;
use crate::types::{Id, User};
use anyhow::Result;
use rusqlite::{ErrorCode, OptionalExtension, Row, params};

/// Returned by [`Database::create_user`] when the username is already in use.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("A user with that username already exists.")]
pub struct UsernameTaken;

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        date_joined: row.get("date_joined")?,
    })
}

impl Database {
    /// Create a user with the given plain-text password.
    /// Fails with [`UsernameTaken`] if the name is in use.
    pub fn create_user(&self, username: &str, raw_password: &str) -> Result<User> {
        let hash = password::hash_password(raw_password);
        let now = now_ms();

        self.with_conn(|conn| {
            // Duplicate names are rejected by the UNIQUE index.
            conn.execute(
                "INSERT INTO users (username, password_hash, date_joined) VALUES (?1, ?2, ?3)",
                params![username, hash, now],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    anyhow::Error::from(UsernameTaken)
                } else {
                    e.into()
                }
            })?;

            Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: hash,
                date_joined: now,
            })
        })
    }

    /// Get a user by id.
    pub fn get_user(&self, user_id: Id) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT * FROM users WHERE id = ?1",
                    params![user_id],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Get a user by username.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT * FROM users WHERE username = ?1",
                    params![username],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Check credentials. Returns the user when the password matches.
    pub fn authenticate(&self, username: &str, raw_password: &str) -> Result<Option<User>> {
        let user = self.get_user_by_username(username)?;
        Ok(user.filter(|u| password::verify_password(raw_password, &u.password_hash)))
    }

    /// Delete a user; tasks, comments, likes and sessions cascade.
    pub fn delete_user(&self, user_id: Id) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
            Ok(n > 0)
        })
    }
}
