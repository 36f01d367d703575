//! Project dashboard and summary export
//!
//! Reading the dashboard regenerates the project's summary from the
//! session's curation state and writes it back to the backend folder, so the
//! persisted log always reflects the latest view.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use curate_common::export::prepare_output_root;
use curate_common::summary::{persist_summary, SUMMARY_FILE_NAME};
use curate_common::SummaryLine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use super::ApiError;
use crate::context::ProjectContext;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Leave out samples somebody has curated
    #[serde(default)]
    pub hide_curated: bool,
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub project: String,
    pub total_samples: usize,
    pub curated_samples: usize,
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub rows: Vec<SummaryLine>,
}

#[derive(Debug, Serialize)]
pub struct SummaryExportResponse {
    pub path: String,
    pub lines: usize,
}

/// GET /api/projects/:project/dashboard?page=&hide_curated=
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path(project): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let context = ProjectContext::load(&state, &project)?;
    let mut store = session.store.lock().await;
    context.hydrate(&mut store)?;

    let lines = context.persist(&store, &state)?;
    let total_samples = lines
        .iter()
        .map(|line| line.sample.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let curated_samples = lines
        .iter()
        .filter(|line| line.is_curated())
        .map(|line| line.sample.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let visible: Vec<SummaryLine> = if query.hide_curated {
        lines.into_iter().filter(|line| !line.is_curated()).collect()
    } else {
        lines
    };

    let pagination = calculate_pagination(visible.len(), query.page);
    let rows = pagination.slice(&visible).to_vec();

    Ok(Json(DashboardResponse {
        project: context.name,
        total_samples,
        curated_samples,
        total_rows: visible.len(),
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        rows,
    }))
}

/// POST /api/projects/:project/summary
///
/// Writes the summary to `<output>/<project>/curation_summary.txt` and
/// refreshes the backend copy.
pub async fn export_summary(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path(project): Path<String>,
) -> Result<Json<SummaryExportResponse>, ApiError> {
    let context = ProjectContext::load(&state, &project)?;
    let output_root = context.output_root()?.to_path_buf();
    let mut store = session.store.lock().await;
    context.hydrate(&mut store)?;

    let lines = context.persist(&store, &state)?;
    let path = prepare_output_root(&output_root, &context.name)?.join(SUMMARY_FILE_NAME);
    persist_summary(&lines, &path, state.summary_format)?;
    info!(
        "'{}' exported the summary of project '{}' to {}",
        session.username,
        context.name,
        path.display()
    );

    Ok(Json(SummaryExportResponse {
        path: path.display().to_string(),
        lines: lines.len(),
    }))
}
