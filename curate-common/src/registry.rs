//! Project registry
//!
//! Maps project names to their data, output, and summary locations. The
//! registry lives in `config.toml` inside the backend folder:
//!
//! ```toml
//! [projects.cohort_a]
//! data_path = "/data/ichor/cohort_a/"
//! output_path = "/results/curated/"
//! summary_path = "/srv/curate-backend/cohort_a/curation_summary.txt"
//! ```
//!
//! Older registries name the output location `metadata_path`; it is read as
//! `output_path`. Every change rewrites the whole file atomically.

use crate::fs_util::write_atomic;
use crate::summary::SUMMARY_FILE_NAME;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{info, warn};

/// File name of the registry inside the backend folder
pub const REGISTRY_FILE_NAME: &str = "config.toml";

/// Locations of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Root holding one subdirectory per sample
    pub data_path: PathBuf,
    /// Root receiving exports and exported summaries
    #[serde(alias = "metadata_path", default)]
    pub output_path: PathBuf,
    /// The project's curation summary in the backend folder
    pub summary_path: PathBuf,
}

/// What to do with curation history when a project is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Remove the registry entry only; the summary file stays on disk
    #[default]
    RegistryOnly,
    /// Also delete the project's summary file
    PurgeHistory,
}

/// Requested changes to an existing project
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    /// New name; `None` keeps the current one
    pub new_name: Option<String>,
    pub data_path: String,
    pub output_path: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    projects: BTreeMap<String, ProjectEntry>,
}

/// The registry of one backend folder
#[derive(Debug)]
pub struct ProjectRegistry {
    backend: PathBuf,
    document: RegistryDocument,
}

impl ProjectRegistry {
    /// Path of the registry file for `backend`
    pub fn registry_path(backend: &Path) -> PathBuf {
        backend.join(REGISTRY_FILE_NAME)
    }

    /// Open the registry of an existing backend folder
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the folder or registry file is missing or the
    /// file is not a registry document.
    pub fn open(backend: &Path) -> Result<Self> {
        if !backend.is_dir() {
            return Err(Error::Config(format!(
                "Folder does not exist: {}",
                backend.display()
            )));
        }

        let path = Self::registry_path(backend);
        if !path.is_file() {
            return Err(Error::Config(format!(
                "Config file does not exist: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(&path)?;
        let value: toml::Value = toml::from_str(&content)?;
        let well_formed = match value.get("projects") {
            Some(projects) => projects.is_table(),
            // A registry with no projects yet may serialize to an empty document
            None => value.as_table().is_some_and(|t| t.is_empty()),
        };
        if !well_formed {
            return Err(Error::Config(format!(
                "Config file does not have correct formatting: {} has no [projects] table",
                path.display()
            )));
        }
        let document: RegistryDocument = value.try_into()?;

        Ok(Self {
            backend: backend.to_path_buf(),
            document,
        })
    }

    /// Create the backend folder and an empty registry, or open an existing one
    pub fn initialize(backend: &Path) -> Result<Self> {
        if Self::registry_path(backend).is_file() {
            return Self::open(backend);
        }

        fs::create_dir_all(backend)?;
        let registry = Self {
            backend: backend.to_path_buf(),
            document: RegistryDocument::default(),
        };
        registry.save()?;
        info!("Initialized backend folder {}", backend.display());
        Ok(registry)
    }

    pub fn backend(&self) -> &Path {
        &self.backend
    }

    /// Projects in name order
    pub fn projects(&self) -> impl Iterator<Item = (&str, &ProjectEntry)> {
        self.document
            .projects
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn get(&self, name: &str) -> Option<&ProjectEntry> {
        self.document.projects.get(name)
    }

    /// Like [`get`](Self::get), failing with [`Error::NotFound`]
    pub fn require(&self, name: &str) -> Result<&ProjectEntry> {
        self.get(name)
            .ok_or_else(|| Error::NotFound(format!("Project '{}' is not registered", name)))
    }

    /// Summary file location for a project of this backend
    pub fn summary_path_for(&self, name: &str) -> PathBuf {
        self.backend.join(name).join(SUMMARY_FILE_NAME)
    }

    /// Register a new project
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for an empty or unusable name, an empty data
    /// path, or a name that is already registered. Nothing is written then.
    pub fn create(&mut self, name: &str, data_path: &str, output_path: &str) -> Result<ProjectEntry> {
        let name = validate_name(name)?;
        if self.document.projects.contains_key(&name) {
            return Err(Error::InvalidInput(format!(
                "Project '{}' already exists",
                name
            )));
        }

        let entry = ProjectEntry {
            data_path: required_dir(data_path, "data path")?,
            output_path: optional_dir(output_path),
            summary_path: self.summary_path_for(&name),
        };

        self.document.projects.insert(name.clone(), entry.clone());
        self.save()?;
        info!("Project '{}' created (data: {})", name, entry.data_path.display());
        Ok(entry)
    }

    /// Change a project's paths and optionally its name
    ///
    /// On rename, the summary file is moved to the new project's summary
    /// path before the registry is rewritten, so curation history follows
    /// the project.
    pub fn update(&mut self, name: &str, update: ProjectUpdate) -> Result<ProjectEntry> {
        let current = self.require(name)?.clone();
        let data_path = required_dir(&update.data_path, "data path")?;
        let output_path = optional_dir(&update.output_path);

        let target = match update.new_name {
            Some(new_name) => validate_name(&new_name)?,
            None => name.to_string(),
        };

        let summary_path = if target != name {
            if self.document.projects.contains_key(&target) {
                return Err(Error::InvalidInput(format!(
                    "Project '{}' already exists",
                    target
                )));
            }
            let new_summary = self.summary_path_for(&target);
            move_summary(&current.summary_path, &new_summary)?;
            new_summary
        } else {
            current.summary_path
        };

        let entry = ProjectEntry {
            data_path,
            output_path,
            summary_path,
        };

        self.document.projects.remove(name);
        self.document.projects.insert(target.clone(), entry.clone());
        self.save()?;

        if target != name {
            info!("Project '{}' renamed to '{}'", name, target);
        } else {
            info!("Project '{}' updated", name);
        }
        Ok(entry)
    }

    /// Delete a project from the registry
    pub fn remove(&mut self, name: &str, mode: DeleteMode) -> Result<ProjectEntry> {
        let entry = self
            .document
            .projects
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("Project '{}' is not registered", name)))?;
        self.save()?;

        if mode == DeleteMode::PurgeHistory {
            match fs::remove_file(&entry.summary_path) {
                Ok(()) => info!("Deleted summary {}", entry.summary_path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            if let Some(parent) = entry.summary_path.parent() {
                // Only succeeds when the project folder is now empty
                let _ = fs::remove_dir(parent);
            }
        }

        info!("Project '{}' deleted ({:?})", name, mode);
        Ok(entry)
    }

    /// Rewrite the registry file
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(&self.document)?;
        write_atomic(&Self::registry_path(&self.backend), content.as_bytes())
    }
}

fn move_summary(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        warn!(
            "No summary at {} to move; project starts without history",
            from.display()
        );
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(from, to)?;
    if let Some(parent) = from.parent() {
        let _ = fs::remove_dir(parent);
    }
    info!("Moved summary {} -> {}", from.display(), to.display());
    Ok(())
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Project name must not be empty".to_string()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidInput(format!(
            "Project name '{}' cannot be used as a folder name",
            name
        )));
    }
    Ok(name.to_string())
}

fn required_dir(path: &str, what: &str) -> Result<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return Err(Error::InvalidInput(format!("Project {} must not be empty", what)));
    }
    Ok(with_trailing_separator(path))
}

fn optional_dir(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        PathBuf::new()
    } else {
        with_trailing_separator(path)
    }
}

/// Normalize a directory path to end with a separator
pub fn with_trailing_separator(path: &str) -> PathBuf {
    if path.ends_with('/') || path.ends_with(MAIN_SEPARATOR) {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("{}{}", path, MAIN_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_trailing_separator() {
        assert_eq!(with_trailing_separator("/data/x"), PathBuf::from("/data/x/"));
        assert_eq!(with_trailing_separator("/data/x/"), PathBuf::from("/data/x/"));
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("  ").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("..").is_err());
        assert_eq!(validate_name(" cohort ").unwrap(), "cohort");
    }

    #[test]
    fn test_open_missing_folder() {
        let dir = TempDir::new().unwrap();
        let err = ProjectRegistry::open(&dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("Folder does not exist"));
    }

    #[test]
    fn test_open_without_projects_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(REGISTRY_FILE_NAME), "backend_path = \"/x\"\n").unwrap();
        let err = ProjectRegistry::open(dir.path()).unwrap_err();
        assert!(err.to_string().contains("correct formatting"));
    }

    #[test]
    fn test_create_rejects_empty_fields_without_writing() {
        let dir = TempDir::new().unwrap();
        let mut registry = ProjectRegistry::initialize(dir.path()).unwrap();

        assert!(matches!(
            registry.create("", "/data/", "/out/"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            registry.create("P", " ", "/out/"),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(registry.projects().count(), 0);
        assert_eq!(ProjectRegistry::open(dir.path()).unwrap().projects().count(), 0);
    }
}
