//! Liveness and backend readiness
//!
//! `/health` answers without a session. Besides liveness it reports whether
//! the project registry in the backend folder can still be opened, since
//! every curation endpoint depends on it.

use axum::{extract::State, routing::get, Json, Router};
use curate_common::ProjectRegistry;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the registry cannot be opened
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub backend_folder: PathBuf,
    pub registry_readable: bool,
    /// Registered projects; absent when the registry is unreadable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_error: Option<String>,
    pub active_sessions: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (project_count, registry_error) = match ProjectRegistry::open(&state.backend) {
        Ok(registry) => (Some(registry.projects().count()), None),
        Err(e) => {
            warn!("Health check: registry unavailable: {}", e);
            (None, Some(e.to_string()))
        }
    };
    let registry_readable = registry_error.is_none();

    Json(HealthResponse {
        status: if registry_readable { "ok" } else { "degraded" },
        module: "curate-server",
        version: env!("CARGO_PKG_VERSION"),
        backend_folder: state.backend.clone(),
        registry_readable,
        project_count,
        registry_error,
        active_sessions: state.sessions.len().await,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
