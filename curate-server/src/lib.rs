//! curate-server library - curation review service
//!
//! Serves the curation workflow over HTTP/JSON: project registry
//! management, the per-project dashboard, candidate browsing, recording
//! selections, and exports.

use axum::Router;
use curate_common::auth::Authenticator;
use curate_common::SummaryFormat;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod context;
pub mod pagination;
pub mod session;

use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Backend folder holding the project registry and summary files
    pub backend: PathBuf,
    /// Logged-in reviewers
    pub sessions: SessionStore,
    /// Login predicate
    pub authenticator: Arc<dyn Authenticator>,
    /// Column layout of persisted summaries
    pub summary_format: SummaryFormat,
}

impl AppState {
    /// Create new application state
    pub fn new(
        backend: PathBuf,
        authenticator: Arc<dyn Authenticator>,
        summary_format: SummaryFormat,
    ) -> Self {
        Self {
            backend,
            sessions: SessionStore::new(),
            authenticator,
            summary_format,
        }
    }

    /// Replace the session store with one dropping sessions idle for `timeout`
    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.sessions = SessionStore::with_idle_timeout(timeout);
        self
    }
}

/// Build application router
///
/// Health and login are public; everything else requires a session token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // Protected routes (require a session)
    let protected = Router::new()
        .route("/api/logout", post(api::logout))
        .route(
            "/api/projects",
            get(api::list_projects).post(api::create_project),
        )
        .route(
            "/api/projects/:project",
            put(api::update_project).delete(api::delete_project),
        )
        .route("/api/projects/:project/dashboard", get(api::get_dashboard))
        .route("/api/projects/:project/summary", post(api::export_summary))
        .route("/api/projects/:project/export", post(api::export_project))
        .route(
            "/api/projects/:project/samples/:sample/candidates",
            get(api::get_candidates),
        )
        .route(
            "/api/projects/:project/samples/:sample/files/*path",
            get(api::get_sample_file),
        )
        .route(
            "/api/projects/:project/samples/:sample/curation",
            put(api::set_curation).delete(api::clear_curation),
        )
        .route(
            "/api/projects/:project/samples/:sample/export",
            post(api::export_sample),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no session)
    let public = Router::new()
        .route("/api/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
