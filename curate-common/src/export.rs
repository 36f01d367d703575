//! Artifact export
//!
//! Copies the artifacts of one solution from a sample's source tree into
//! `<output_root>/<project>/<sample>/`. Export has replace semantics: the
//! destination is deleted and rebuilt each time, so repeating an export
//! (including after an interrupted one) converges on the same tree.
//!
//! The selector is a plain substring: `optimal` for the pipeline default, or
//! a solution token such as `n0.3-p3`. Files whose name contains it are
//! copied flat into the destination; directories whose name contains it
//! (with `-` turned into `_`) are copied whole.

use crate::curation::CurationStore;
use crate::naming::{folder_selector, SolutionToken};
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Selector exporting the pipeline's own preferred solution
pub const DEFAULT_SELECTOR: &str = "optimal";

/// Outcome of exporting one sample
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub sample: String,
    pub selector: String,
    pub destination: PathBuf,
    pub files_copied: usize,
    pub directories_copied: usize,
}

impl ExportReport {
    /// Nothing matched the selector; the destination exists but is empty
    pub fn is_empty(&self) -> bool {
        self.files_copied == 0 && self.directories_copied == 0
    }
}

/// A sample that could not be exported during a batch export
#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    pub sample: String,
    pub selector: Option<String>,
    pub error: String,
}

/// Outcome of exporting a whole project
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportAllReport {
    pub exported: Vec<ExportReport>,
    /// Uncurated samples left out because only curated samples were requested
    pub skipped: Vec<String>,
    pub failures: Vec<ExportFailure>,
}

/// Create `<output_root>/<project>` if needed and return it
pub fn prepare_output_root(output_root: &Path, project: &str) -> Result<PathBuf> {
    let project_root = output_root.join(project);
    fs::create_dir_all(&project_root)?;
    Ok(project_root)
}

/// Export the artifacts of `sample` matching `selector`
///
/// # Errors
///
/// [`Error::NotFound`] if `<source_root>/<sample>` is not a directory. I/O
/// and walk errors propagate. A selector matching nothing is not an error:
/// the report is empty and the destination directory exists.
pub fn export(
    sample: &str,
    source_root: &Path,
    output_root: &Path,
    project: &str,
    selector: &str,
) -> Result<ExportReport> {
    let source = source_root.join(sample);
    if !source.is_dir() {
        return Err(Error::NotFound(format!(
            "Sample folder {} does not exist",
            source.display()
        )));
    }

    let destination = output_root.join(project).join(sample);
    if destination.is_dir() {
        fs::remove_dir_all(&destination)?;
    } else if destination.exists() {
        fs::remove_file(&destination)?;
    }
    fs::create_dir_all(&destination)?;

    let dir_selector = folder_selector(selector);
    let mut report = ExportReport {
        sample: sample.to_string(),
        selector: selector.to_string(),
        destination: destination.clone(),
        files_copied: 0,
        directories_copied: 0,
    };

    let walker = WalkDir::new(&source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        let name = entry.file_name().to_string_lossy();
        // Path checks follow symlinks, so a linked file or folder is exported
        // as what it points to
        let path = entry.path();

        if path.is_file() && name.contains(selector) {
            fs::copy(path, destination.join(entry.file_name()))?;
            report.files_copied += 1;
        } else if path.is_dir() && name.contains(&dir_selector) {
            copy_dir_recursive(path, &destination.join(entry.file_name()))?;
            report.directories_copied += 1;
        } else if entry.path_is_symlink() && !path.exists() && name.contains(selector) {
            warn!("Not exporting dangling link {}", path.display());
        }
    }

    grant_full_access(&destination)?;

    if report.is_empty() {
        warn!(
            "Nothing in {} matched '{}'; exported an empty folder",
            source.display(),
            selector
        );
    } else {
        info!(
            "Exported sample '{}' ({}) to {}: {} files, {} folders",
            sample,
            selector,
            destination.display(),
            report.files_copied,
            report.directories_copied
        );
    }

    Ok(report)
}

/// Export every sample of a project
///
/// Curated samples are exported once per (user, selection) using the
/// selection's solution token; each pass replaces the previous one, so the
/// last curating user's choice is what remains on disk. Uncurated samples
/// get the default export unless `curated_only` is set. A failing sample is
/// recorded and the batch carries on.
pub fn export_all(
    samples: &[String],
    store: &CurationStore,
    source_root: &Path,
    output_root: &Path,
    project: &str,
    curated_only: bool,
) -> Result<ExportAllReport> {
    prepare_output_root(output_root, project)?;
    let mut report = ExportAllReport::default();

    for sample in samples {
        if store.has_any_curation(project, sample) {
            for (user, record) in store.records_for(project, sample) {
                let Some(token) = SolutionToken::from_filename(&record.artifact_id) else {
                    warn!(
                        "Selection '{}' of user '{}' for sample '{}' has no solution token",
                        record.artifact_id, user, sample
                    );
                    report.failures.push(ExportFailure {
                        sample: sample.clone(),
                        selector: None,
                        error: format!(
                            "Selected artifact '{}' carries no solution token",
                            record.artifact_id
                        ),
                    });
                    continue;
                };
                let selector = token.file_token();
                run_one(&mut report, sample, source_root, output_root, project, &selector);
            }
        } else if curated_only {
            debug!("Skipping uncurated sample '{}'", sample);
            report.skipped.push(sample.clone());
        } else {
            run_one(&mut report, sample, source_root, output_root, project, DEFAULT_SELECTOR);
        }
    }

    info!(
        "Project '{}' export finished: {} exported, {} skipped, {} failed",
        project,
        report.exported.len(),
        report.skipped.len(),
        report.failures.len()
    );
    Ok(report)
}

fn run_one(
    report: &mut ExportAllReport,
    sample: &str,
    source_root: &Path,
    output_root: &Path,
    project: &str,
    selector: &str,
) {
    match export(sample, source_root, output_root, project, selector) {
        Ok(done) => report.exported.push(done),
        Err(e) => {
            warn!("Export of sample '{}' failed: {}", sample, e);
            report.failures.push(ExportFailure {
                sample: sample.to_string(),
                selector: Some(selector.to_string()),
                error: e.to_string(),
            });
        }
    }
}

/// Map walk failures on vanished paths to [`Error::NotFound`]
///
/// A sample folder removed while it is being exported reports a walk
/// error; callers should see it the same way as a folder that was never
/// there.
fn walk_error(err: walkdir::Error) -> Error {
    let vanished = err
        .io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound);
    if vanished {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        Error::NotFound(format!("{} disappeared during export: {}", path, err))
    } else {
        Error::Walk(err)
    }
}

/// Copy a directory tree, merging into `dst` if it already exists
///
/// Symlinks are followed; walkdir reports link cycles as errors.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(walk_error)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
        } else {
            debug!("Not copying special file {}", entry.path().display());
        }
    }
    Ok(())
}

/// Give owner, group, and other full access to everything under `root`
///
/// Source trees are often read-only; the export must stay modifiable by
/// whoever processes it next.
fn grant_full_access(root: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(walk_error)?;
            if entry.file_type().is_symlink() {
                continue;
            }
            fs::set_permissions(entry.path(), fs::Permissions::from_mode(0o777))?;
        }
    }
    #[cfg(not(unix))]
    {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(walk_error)?;
            let mut permissions = entry.metadata()?.permissions();
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
}
