//! Per-request project context
//!
//! Handlers re-read the registry from disk on every request, so changes made
//! by other sessions are picked up immediately.

use crate::api::ApiError;
use crate::AppState;
use curate_common::samples::list_samples;
use curate_common::summary::{build_summary, persist_summary};
use curate_common::{CurationStore, ProjectEntry, ProjectRegistry, SummaryLine};
use std::path::{Path, PathBuf};

/// Open the registry of the configured backend folder
pub fn open_registry(state: &AppState) -> Result<ProjectRegistry, ApiError> {
    Ok(ProjectRegistry::open(&state.backend)?)
}

/// A registered project, as found in the registry at request time
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub name: String,
    pub entry: ProjectEntry,
}

impl ProjectContext {
    pub fn load(state: &AppState, name: &str) -> Result<Self, ApiError> {
        let registry = open_registry(state)?;
        let entry = registry.require(name)?.clone();
        Ok(Self {
            name: name.to_string(),
            entry,
        })
    }

    /// Hydrate the project into `store` on first touch
    pub fn hydrate(&self, store: &mut CurationStore) -> Result<(), ApiError> {
        store.ensure_hydrated(&self.name, &self.entry.summary_path)?;
        Ok(())
    }

    /// Directory of `sample` under the data path
    ///
    /// # Errors
    ///
    /// 400 for names that are not a single path segment, 404 if the
    /// directory does not exist.
    pub fn sample_dir(&self, sample: &str) -> Result<PathBuf, ApiError> {
        if !is_plain_segment(sample) {
            return Err(ApiError::BadRequest(format!(
                "Invalid sample name '{}'",
                sample
            )));
        }
        let dir = self.entry.data_path.join(sample);
        if !dir.is_dir() {
            return Err(ApiError::NotFound(format!(
                "Sample '{}' not found in project '{}'",
                sample, self.name
            )));
        }
        Ok(dir)
    }

    /// Output root for exports; projects registered without one cannot export
    pub fn output_root(&self) -> Result<&Path, ApiError> {
        if self.entry.output_path.as_os_str().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Project '{}' has no output path",
                self.name
            )));
        }
        Ok(&self.entry.output_path)
    }

    pub fn samples(&self) -> Result<Vec<String>, ApiError> {
        Ok(list_samples(&self.entry.data_path)?)
    }

    /// Rebuild the summary from `store` and overwrite the project's summary file
    pub fn persist(
        &self,
        store: &CurationStore,
        state: &AppState,
    ) -> Result<Vec<SummaryLine>, ApiError> {
        let samples = self.samples()?;
        let lines = build_summary(&samples, store, &self.name, &self.entry.data_path);
        persist_summary(&lines, &self.entry.summary_path, state.summary_format)?;
        Ok(lines)
    }
}

/// True if `name` is a single normal path component
pub fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
