//! On-disk solution metadata lookup
//!
//! Resolves a [`SolutionToken`] against a sample's data directory: the
//! solution detail folder, the authoritative tumor fraction / ploidy from
//! `<sample>.params.txt`, and the pipeline's default ("optimal") candidate.

use crate::fs_util::sorted_subdirectories;
use crate::naming::{SolutionToken, OPTIMAL_MARKER};
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Tumor fraction and ploidy as recorded in a solution's params file
///
/// These are the values shown to reviewers; they may differ in precision
/// from the values encoded in filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionParams {
    pub tumor_fraction: String,
    pub ploidy: String,
}

impl SolutionParams {
    /// Status text written to the summary file for a resolved curation
    pub fn display_status(&self) -> String {
        format!(
            "Tumor Fraction {}, Ploidy {}",
            self.tumor_fraction, self.ploidy
        )
    }
}

/// Name of the params file inside a solution detail folder
pub fn params_file_name(sample: &str) -> String {
    format!("{}.params.txt", sample)
}

/// First detail folder (name order) under `sample_dir` ending with the token's folder form
pub fn find_solution_folder(sample_dir: &Path, token: &SolutionToken) -> Option<String> {
    let suffix = token.folder_token();
    match sorted_subdirectories(sample_dir) {
        Ok(folders) => folders.into_iter().find(|name| name.ends_with(&suffix)),
        Err(e) => {
            warn!("Cannot list {}: {}", sample_dir.display(), e);
            None
        }
    }
}

/// Read tumor fraction and ploidy for `token` from the sample's params file
///
/// The params file lives in the detail folder whose name ends with
/// `n<tf>_p<ploidy>`. Line index 1 is tab-separated with the tumor fraction
/// in column 1 and the ploidy in column 2.
///
/// # Errors
///
/// [`Error::MetadataNotFound`] if the sample folder cannot be listed, no
/// detail folder matches, no params file exists in any matching folder, or
/// the params file lacks the expected line or columns.
pub fn resolve_solution_params(
    sample_dir: &Path,
    sample: &str,
    token: &SolutionToken,
) -> Result<SolutionParams> {
    let not_found = |reason: String| Error::MetadataNotFound {
        sample: sample.to_string(),
        solution: token.file_token(),
        reason,
    };

    let folders = sorted_subdirectories(sample_dir).map_err(|e| {
        not_found(format!(
            "cannot list sample folder {}: {}",
            sample_dir.display(),
            e
        ))
    })?;

    let suffix = token.folder_token();
    let params_name = params_file_name(sample);
    let mut matched_folder = false;

    for folder in folders.iter().filter(|name| name.ends_with(&suffix)) {
        matched_folder = true;
        let candidate = sample_dir.join(folder).join(&params_name);
        if candidate.is_file() {
            debug!("Reading solution params from {}", candidate.display());
            let content = fs::read_to_string(&candidate).map_err(|e| {
                not_found(format!("cannot read {}: {}", candidate.display(), e))
            })?;
            return parse_params(&content).ok_or_else(|| {
                not_found(format!(
                    "{} has no tab-separated tumor fraction and ploidy on line 2",
                    candidate.display()
                ))
            });
        }
    }

    if matched_folder {
        Err(not_found(format!(
            "no {} in folders ending with {}",
            params_name, suffix
        )))
    } else {
        Err(not_found(format!("no solution folder ending with {}", suffix)))
    }
}

fn parse_params(content: &str) -> Option<SolutionParams> {
    let line = content.lines().nth(1)?;
    let fields: Vec<&str> = line.trim().split('\t').collect();
    if fields.len() < 3 {
        return None;
    }
    Some(SolutionParams {
        tumor_fraction: fields[1].trim().to_string(),
        ploidy: fields[2].trim().to_string(),
    })
}

/// Token of the pipeline's preferred solution, from the folder containing "optimal"
pub fn optimal_token(sample_dir: &Path) -> Option<SolutionToken> {
    let folders = match sorted_subdirectories(sample_dir) {
        Ok(folders) => folders,
        Err(e) => {
            warn!("Cannot list {}: {}", sample_dir.display(), e);
            return None;
        }
    };

    folders
        .iter()
        .filter(|name| name.contains(OPTIMAL_MARKER))
        .find_map(|name| SolutionToken::from_folder_name(name))
}

/// Move the optimal candidate to the front of `candidates`
///
/// Relative order of the other candidates is preserved. If there is no
/// optimal folder, or no candidate carries its token, the list is left
/// unchanged and the first entry stays the default. Returns the promoted
/// token when a move happened.
pub fn promote_default(sample_dir: &Path, candidates: &mut Vec<String>) -> Option<SolutionToken> {
    let token = optimal_token(sample_dir)?;
    let needle = token.file_token();
    let position = candidates.iter().position(|name| name.contains(&needle))?;

    let optimal = candidates.remove(position);
    candidates.insert(0, optimal);
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_with_folder(folder: &str, params: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        let folder_path = dir.path().join(folder);
        fs::create_dir_all(&folder_path).unwrap();
        if let Some(content) = params {
            fs::write(folder_path.join("S01.params.txt"), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_params_are_read_from_matching_folder() {
        let dir = sample_with_folder(
            "S01_n0.3_p3",
            Some("Sample\tTumor Fraction\tPloidy\nS01\t0.2874\t3.02\n"),
        );

        let params =
            resolve_solution_params(dir.path(), "S01", &SolutionToken::new("0.3", "3")).unwrap();

        assert_eq!(params.tumor_fraction, "0.2874");
        assert_eq!(params.ploidy, "3.02");
        assert_eq!(params.display_status(), "Tumor Fraction 0.2874, Ploidy 3.02");
    }

    #[test]
    fn test_missing_folder_is_metadata_not_found() {
        let dir = sample_with_folder("S01_n0.1_p2", Some("h\nS01\t0.1\t2\n"));

        let err = resolve_solution_params(dir.path(), "S01", &SolutionToken::new("0.3", "3"))
            .unwrap_err();

        assert!(matches!(err, Error::MetadataNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_params_file_is_metadata_not_found() {
        let dir = sample_with_folder("S01_n0.3_p3", None);

        let err = resolve_solution_params(dir.path(), "S01", &SolutionToken::new("0.3", "3"))
            .unwrap_err();

        match err {
            Error::MetadataNotFound { reason, .. } => assert!(reason.contains("S01.params.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_params_file_is_metadata_not_found() {
        let dir = sample_with_folder("S01_n0.3_p3", Some("header only\n"));

        let err = resolve_solution_params(dir.path(), "S01", &SolutionToken::new("0.3", "3"))
            .unwrap_err();

        assert!(matches!(err, Error::MetadataNotFound { .. }));
    }

    #[test]
    fn test_find_solution_folder() {
        let dir = sample_with_folder("S01_optimal_n0.3_p3", None);
        fs::create_dir(dir.path().join("S01_n0.1_p2")).unwrap();

        assert_eq!(
            find_solution_folder(dir.path(), &SolutionToken::new("0.1", "2")).as_deref(),
            Some("S01_n0.1_p2")
        );
        assert_eq!(find_solution_folder(dir.path(), &SolutionToken::new("0.5", "2")), None);
    }

    #[test]
    fn test_find_solution_folder_requires_token_at_end() {
        let dir = sample_with_folder("S01_n0.1_p20", None);
        fs::create_dir(dir.path().join("S01_n0.1_p2_backup")).unwrap();

        assert_eq!(find_solution_folder(dir.path(), &SolutionToken::new("0.1", "2")), None);

        fs::create_dir(dir.path().join("S01_n0.1_p2")).unwrap();
        assert_eq!(
            find_solution_folder(dir.path(), &SolutionToken::new("0.1", "2")).as_deref(),
            Some("S01_n0.1_p2")
        );
    }

    #[test]
    fn test_promote_default_moves_optimal_first() {
        let dir = sample_with_folder("S01_optimal_n0.3_p3", None);
        fs::create_dir(dir.path().join("S01_n0.1_p2")).unwrap();

        let mut candidates = vec![
            "S01_genomeWide_n0.1-p2.pdf".to_string(),
            "S01_genomeWide_n0.3-p3.pdf".to_string(),
        ];
        let promoted = promote_default(dir.path(), &mut candidates);

        assert_eq!(promoted, Some(SolutionToken::new("0.3", "3")));
        assert_eq!(candidates[0], "S01_genomeWide_n0.3-p3.pdf");
        assert_eq!(candidates[1], "S01_genomeWide_n0.1-p2.pdf");
    }

    #[test]
    fn test_promote_default_without_optimal_folder_keeps_order() {
        let dir = sample_with_folder("S01_n0.3_p3", None);

        let mut candidates = vec![
            "S01_genomeWide_n0.1-p2.pdf".to_string(),
            "S01_genomeWide_n0.3-p3.pdf".to_string(),
        ];
        let before = candidates.clone();

        assert_eq!(promote_default(dir.path(), &mut candidates), None);
        assert_eq!(candidates, before);
    }

    #[test]
    fn test_promote_default_without_matching_candidate_keeps_order() {
        let dir = sample_with_folder("S01_optimal_n0.9_p4", None);

        let mut candidates = vec![
            "S01_genomeWide_n0.1-p2.pdf".to_string(),
            "S01_genomeWide_n0.3-p3.pdf".to_string(),
        ];
        let before = candidates.clone();

        assert_eq!(promote_default(dir.path(), &mut candidates), None);
        assert_eq!(candidates, before);
    }
}
