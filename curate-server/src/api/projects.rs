//! Project registry endpoints
//!
//! Listing with curation progress, create, edit/rename, and delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use curate_common::summary::ProjectProgress;
use curate_common::{DeleteMode, ProjectEntry, ProjectUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiError;
use crate::context::open_registry;
use crate::session::Session;
use crate::AppState;

/// A project with its locations
#[derive(Debug, Serialize)]
pub struct ProjectView {
    pub name: String,
    #[serde(flatten)]
    pub entry: ProjectEntry,
}

/// One row of the projects overview
#[derive(Debug, Serialize)]
pub struct ProjectOverview {
    pub name: String,
    #[serde(flatten)]
    pub entry: ProjectEntry,
    pub progress: ProjectProgress,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub backend: String,
    pub projects: Vec<ProjectOverview>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub data_path: String,
    #[serde(default)]
    pub output_path: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    /// New project name; omitted or equal to the current name keeps it
    #[serde(default)]
    pub new_name: Option<String>,
    pub data_path: String,
    #[serde(default)]
    pub output_path: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProjectQuery {
    /// Also delete the project's summary file
    #[serde(default)]
    pub purge_history: bool,
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let registry = open_registry(&state)?;

    let projects = registry
        .projects()
        .map(|(name, entry)| ProjectOverview {
            name: name.to_string(),
            entry: entry.clone(),
            progress: ProjectProgress::collect(&entry.data_path, &entry.summary_path),
        })
        .collect();

    Ok(Json(ProjectsResponse {
        backend: state.backend.display().to_string(),
        projects,
    }))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectView>), ApiError> {
    let mut registry = open_registry(&state)?;
    let name = request.name.trim().to_string();
    if registry.get(&name).is_some() {
        return Err(ApiError::Conflict(format!(
            "Project '{}' already exists",
            name
        )));
    }

    let entry = registry.create(&name, &request.data_path, &request.output_path)?;
    Ok((StatusCode::CREATED, Json(ProjectView { name, entry })))
}

/// PUT /api/projects/:project
///
/// Renaming carries the project's curation history along with it.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path(project): Path<String>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectView>, ApiError> {
    let mut registry = open_registry(&state)?;
    let target = request
        .new_name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&project)
        .to_string();

    if target != project && registry.get(&target).is_some() {
        return Err(ApiError::Conflict(format!(
            "Project '{}' already exists",
            target
        )));
    }

    let mut store = session.store.lock().await;
    let entry = registry.update(
        &project,
        ProjectUpdate {
            new_name: request.new_name,
            data_path: request.data_path,
            output_path: request.output_path,
        },
    )?;
    if target != project {
        store.rename_project(&project, &target);
    }

    Ok(Json(ProjectView {
        name: target,
        entry,
    }))
}

/// DELETE /api/projects/:project?purge_history=
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(session): Extension<Arc<Session>>,
    Path(project): Path<String>,
    Query(query): Query<DeleteProjectQuery>,
) -> Result<StatusCode, ApiError> {
    let mode = if query.purge_history {
        DeleteMode::PurgeHistory
    } else {
        DeleteMode::RegistryOnly
    };

    let mut registry = open_registry(&state)?;
    registry.remove(&project, mode)?;
    session.store.lock().await.drop_project(&project);

    Ok(StatusCode::NO_CONTENT)
}
