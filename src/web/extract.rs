//! Request extractors shared by the handlers.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use tracing::debug;

use crate::error::{ErrorCode, WebError};
use crate::types::Id;

/// A numeric id from the route. Anything that is not an integer is a 404.
#[derive(Debug, Clone, Copy)]
pub(super) struct IdPath(pub Id);

impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Id>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(IdPath(id)),
            Err(rejection) => {
                debug!(path = %parts.uri.path(), error = %rejection.body_text(), "rejected id");
                Err(WebError::new(ErrorCode::NotFound, "Page not found"))
            }
        }
    }
}
