//! Structured error type for request handlers.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::web::render;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by handlers and permission checks.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct WebError {
    pub code: ErrorCode,
    pub message: String,
}

impl WebError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::NotFound, format!("No task found with id {}", task_id))
    }

    pub fn comment_not_found(comment_id: i64) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("No comment found with id {}", comment_id),
        )
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Internal, err.to_string())
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<WebError>() {
            Ok(web_err) => web_err,
            Err(err) => WebError::internal(format!("{:#}", err)),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let message = match self.code {
            ErrorCode::Internal => {
                tracing::error!(error = %self.message, "request failed");
                "Something went wrong on our side.".to_string()
            }
            _ => {
                tracing::debug!(code = ?self.code, error = %self.message, "request rejected");
                self.message
            }
        };
        let title = status.canonical_reason().unwrap_or("Error");
        (status, Html(render::error_page(status.as_u16(), title, &message))).into_response()
    }
}

/// Result type for handlers.
pub type WebResult<T> = std::result::Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_wrapping_preserves_web_error() {
        let err: anyhow::Error = WebError::forbidden("nope").into();
        let back = WebError::from(err);
        assert_eq!(back.code, ErrorCode::Forbidden);
        assert_eq!(back.message, "nope");
    }

    #[test]
    fn plain_anyhow_becomes_internal() {
        let back = WebError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(back.code, ErrorCode::Internal);
        assert_eq!(back.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
