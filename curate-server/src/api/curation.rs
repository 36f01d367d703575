//! Sample curation endpoints
//!
//! Candidate listing, raw artifact bytes, and recording or clearing the
//! session user's selection. Every change rewrites the project's summary.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Extension, Json,
};
use curate_common::naming::is_genome_wide_artifact;
use curate_common::samples::SampleCandidates;
use curate_common::summary::validate_summary_field;
use curate_common::time::now;
use curate_common::SolutionToken;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path as FsPath};
use std::sync::Arc;

use super::ApiError;
use crate::context::ProjectContext;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    #[serde(flatten)]
    pub listing: SampleCandidates,
    /// The session user's current selection
    pub selected: Option<String>,
    /// Everyone who has curated this sample, in curation order
    pub curated_users: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetCurationRequest {
    /// Genome-wide artifact filename of the chosen candidate
    pub artifact: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearCurationQuery {
    /// Whose selection to clear; defaults to the session user
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurationResponse {
    pub sample: String,
    pub user: String,
    pub artifact: Option<String>,
    pub curated_users: Vec<String>,
}

/// GET /api/projects/:project/samples/:sample/candidates
pub async fn get_candidates(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path((project, sample)): Path<(String, String)>,
) -> Result<Json<CandidatesResponse>, ApiError> {
    let context = ProjectContext::load(&state, &project)?;
    context.sample_dir(&sample)?;
    let listing = SampleCandidates::load(&context.entry.data_path, &sample)?;

    let mut store = session.store.lock().await;
    context.hydrate(&mut store)?;

    Ok(Json(CandidatesResponse {
        selected: store
            .get(&context.name, &sample, &session.username)
            .map(|record| record.artifact_id.clone()),
        curated_users: store.list_curated_users(&context.name, &sample),
        listing,
    }))
}

/// GET /api/projects/:project/samples/:sample/files/*path
///
/// Serves a file from inside the sample directory.
pub async fn get_sample_file(
    State(state): State<AppState>,
    Path((project, sample, path)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let context = ProjectContext::load(&state, &project)?;
    let sample_dir = context.sample_dir(&sample)?;

    let relative = FsPath::new(&path);
    if relative.as_os_str().is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(ApiError::BadRequest(format!("Invalid file path '{}'", path)));
    }

    let file = sample_dir.join(relative);
    let bytes = tokio::fs::read(&file).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("File '{}' not found in sample '{}'", path, sample))
        } else {
            ApiError::Internal(format!("Cannot read {}: {}", file.display(), e))
        }
    })?;

    Ok(([(CONTENT_TYPE, content_type_for(&path))], Body::from(bytes)).into_response())
}

fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" | "tsv" | "seg" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// PUT /api/projects/:project/samples/:sample/curation
pub async fn set_curation(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path((project, sample)): Path<(String, String)>,
    Json(request): Json<SetCurationRequest>,
) -> Result<Json<CurationResponse>, ApiError> {
    let artifact = request.artifact.trim();
    if artifact.is_empty() {
        return Err(ApiError::BadRequest("Artifact must not be empty".to_string()));
    }
    validate_summary_field(artifact, "Artifact")?;
    if !is_genome_wide_artifact(artifact) || SolutionToken::from_filename(artifact).is_none() {
        return Err(ApiError::BadRequest(format!(
            "'{}' is not a genome-wide candidate filename",
            artifact
        )));
    }

    let context = ProjectContext::load(&state, &project)?;
    context.sample_dir(&sample)?;

    let mut store = session.store.lock().await;
    context.hydrate(&mut store)?;
    store.set_selection(&context.name, &sample, &session.username, artifact, now())?;
    context.persist(&store, &state)?;

    Ok(Json(CurationResponse {
        curated_users: store.list_curated_users(&context.name, &sample),
        sample,
        user: session.username.clone(),
        artifact: Some(artifact.to_string()),
    }))
}

/// DELETE /api/projects/:project/samples/:sample/curation?user=
pub async fn clear_curation(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path((project, sample)): Path<(String, String)>,
    Query(query): Query<ClearCurationQuery>,
) -> Result<Json<CurationResponse>, ApiError> {
    let context = ProjectContext::load(&state, &project)?;
    let user = query.user.unwrap_or_else(|| session.username.clone());

    let mut store = session.store.lock().await;
    context.hydrate(&mut store)?;
    if store.clear_selection(&context.name, &sample, &user).is_some() {
        context.persist(&store, &state)?;
    }

    Ok(Json(CurationResponse {
        curated_users: store.list_curated_users(&context.name, &sample),
        sample,
        user,
        artifact: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("S01_genomeWide_n0.3-p3.pdf"), "application/pdf");
        assert_eq!(content_type_for("plot.PNG"), "image/png");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
