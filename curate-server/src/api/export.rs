//! Export endpoints
//!
//! Exports copy files and can take a while, so they run on the blocking
//! thread pool while the session lock is held.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use curate_common::export::{
    export, export_all, prepare_output_root, ExportAllReport, ExportReport, DEFAULT_SELECTOR,
};
use curate_common::SolutionToken;
use serde::Deserialize;
use std::sync::Arc;

use super::ApiError;
use crate::context::ProjectContext;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportSampleRequest {
    /// Genome-wide artifact whose solution to export; the default solution if omitted
    #[serde(default)]
    pub artifact: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportProjectRequest {
    /// Skip samples nobody has curated instead of exporting their default solution
    #[serde(default)]
    pub curated_only: bool,
}

/// POST /api/projects/:project/samples/:sample/export
pub async fn export_sample(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path((project, sample)): Path<(String, String)>,
    Json(request): Json<ExportSampleRequest>,
) -> Result<Json<ExportReport>, ApiError> {
    let context = ProjectContext::load(&state, &project)?;
    context.sample_dir(&sample)?;
    let output_root = context.output_root()?.to_path_buf();

    let selector = match request.artifact.as_deref().map(str::trim) {
        Some(artifact) if !artifact.is_empty() => SolutionToken::from_filename(artifact)
            .map(|token| token.file_token())
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Artifact '{}' carries no solution token",
                    artifact
                ))
            })?,
        _ => DEFAULT_SELECTOR.to_string(),
    };

    let _guard = session.store.lock().await;
    let source_root = context.entry.data_path.clone();
    let project_name = context.name.clone();
    let report = tokio::task::spawn_blocking(move || {
        prepare_output_root(&output_root, &project_name)?;
        export(&sample, &source_root, &output_root, &project_name, &selector)
    })
    .await??;

    Ok(Json(report))
}

/// POST /api/projects/:project/export
pub async fn export_project(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path(project): Path<String>,
    Json(request): Json<ExportProjectRequest>,
) -> Result<Json<ExportAllReport>, ApiError> {
    let context = ProjectContext::load(&state, &project)?;
    let output_root = context.output_root()?.to_path_buf();
    let samples = context.samples()?;

    let mut store = session.store.lock().await;
    context.hydrate(&mut store)?;
    let snapshot = store.clone();

    let source_root = context.entry.data_path.clone();
    let project_name = context.name.clone();
    let report = tokio::task::spawn_blocking(move || {
        export_all(
            &samples,
            &snapshot,
            &source_root,
            &output_root,
            &project_name,
            request.curated_only,
        )
    })
    .await??;

    Ok(Json(report))
}
