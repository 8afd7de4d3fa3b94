//! HTTP surface for the list distribution backend.
//!
//! # Responsibility
//! - Own the shared SQLite connection and hand it to blocking workers.
//! - Wire routes, CORS and the upload body limit.
//!
//! # Invariants
//! - One connection per process, guarded by a mutex; together with the
//!   IMMEDIATE replace transaction this serializes distribution runs.
//! - A panic inside one operation fails only that request. The lock is
//!   taken back from a poisoned mutex; an uncommitted transaction has already
//!   rolled back when its guard dropped.

pub mod api;
pub mod config;
pub mod error;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use error::ApiError;
use log::warn;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps a connection opened through `listdist_core::db::open_*`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `op` on a blocking worker while holding the connection lock.
    pub async fn with_conn<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = match conn.lock() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    warn!("event=conn_lock module=server status=recovered reason=poisoned");
                    conn.clear_poison();
                    poisoned.into_inner()
                }
            };
            op(&guard)
        })
        .await
        .map_err(|err| ApiError::internal("join_failed", err))?
    }
}

/// Builds the application router.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/api/recipients",
            get(api::list_recipients).post(api::create_recipient),
        )
        .route("/api/recipients/single", post(api::get_recipient))
        .route("/api/recipients/remove", post(api::remove_recipient))
        .route(
            "/api/distribution",
            get(api::list_distribution).post(api::save_distribution),
        )
        .route("/api/distribution/upload", post(api::upload_distribution))
        .route("/api/distribution/preview", post(api::preview_distribution))
        .route(
            "/api/distribution/recipient/:id",
            get(api::recipient_distribution),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
