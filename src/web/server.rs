//! HTTP server: shared state, routing and lifecycle.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{accounts, comments, tasks};
use crate::db::Database;
use crate::media::{MEDIA_URL, MediaKind, MediaStore};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct TrackerServer {
    /// Reference to the database.
    db: Arc<Database>,
    /// Storage for comment uploads.
    media: Arc<MediaStore>,
    /// Lifetime of new login sessions.
    session_ttl: Duration,
    /// Request body limit for uploads.
    max_upload_bytes: usize,
}

impl TrackerServer {
    pub fn new(
        db: Arc<Database>,
        media: MediaStore,
        session_ttl: Duration,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            media: Arc::new(media),
            session_ttl,
            max_upload_bytes,
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Anything that would not be shown inline on the task page is served as a download.
fn media_disposition(response: &Response) -> Option<HeaderValue> {
    if !response.status().is_success() {
        return None;
    }
    let kind = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(MediaKind::Other, MediaKind::from_content_type);
    (kind == MediaKind::Other).then(|| HeaderValue::from_static("attachment"))
}

/// Uploaded files. Responses never run as documents of this origin.
fn media_service(state: &TrackerServer) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(state.media().root()))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_DISPOSITION,
            media_disposition,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("sandbox"),
        ))
}

/// Build the router with all routes.
pub fn build_router(state: TrackerServer) -> Router {
    let media_service = media_service(&state);
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Tasks
        .route("/", get(tasks::task_list))
        .route(
            "/tasks/new",
            get(tasks::task_create_page).post(tasks::task_create),
        )
        .route(
            "/tasks/{task_id}",
            get(tasks::task_detail).post(comments::comment_create),
        )
        .route("/tasks/{task_id}/status", post(tasks::task_change_status))
        .route(
            "/tasks/{task_id}/update",
            get(tasks::task_update_page).post(tasks::task_update),
        )
        .route(
            "/tasks/{task_id}/delete",
            get(tasks::task_delete_page).post(tasks::task_delete),
        )
        // Comments
        .route(
            "/comments/{comment_id}/edit",
            get(comments::comment_edit_page).post(comments::comment_edit),
        )
        .route(
            "/comments/{comment_id}/delete",
            get(comments::comment_delete_page).post(comments::comment_delete),
        )
        .route("/comments/{comment_id}/like", post(comments::comment_like_toggle))
        // Accounts
        .route("/login", get(accounts::login_page).post(accounts::login))
        .route("/logout", get(accounts::logout).post(accounts::logout))
        .route(
            "/register",
            get(accounts::register_page).post(accounts::register),
        )
        .route("/health", get(health))
        .nest_service(MEDIA_URL, media_service)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// Bind `addr` and serve in a background task.
pub async fn start_server(state: TrackerServer, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task tracker listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx: Some(shutdown_tx),
        join,
    })
}
