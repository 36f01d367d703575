//! Sample enumeration and per-sample candidate listing

use crate::fs_util::{sorted_files, sorted_subdirectories};
use crate::naming::{
    is_chromosome_artifact, is_genome_wide_artifact, sort_chromosome_files, Chromosome,
    SolutionToken,
};
use crate::resolver::{find_solution_folder, promote_default};
use crate::{Error, Result};
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

/// List the samples of a project: subdirectories of `data_path`, sorted by name
///
/// # Errors
///
/// [`Error::NotFound`] if `data_path` does not exist or is not a directory.
pub fn list_samples(data_path: &Path) -> Result<Vec<String>> {
    if !data_path.is_dir() {
        return Err(Error::NotFound(format!(
            "Data path {} is not a readable directory",
            data_path.display()
        )));
    }
    Ok(sorted_subdirectories(data_path)?)
}

/// Number of samples under `data_path`, 0 if it cannot be read
pub fn count_samples(data_path: &Path) -> usize {
    list_samples(data_path).map(|s| s.len()).unwrap_or(0)
}

/// One genome-wide solution candidate of a sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Genome-wide plot filename (also the artifact identifier stored on curation)
    pub file_name: String,
    /// Tumor fraction / ploidy encoded in the filename
    pub token: Option<SolutionToken>,
    /// Detail folder holding this solution's params and per-chromosome plots
    pub detail_folder: Option<String>,
}

impl Candidate {
    /// Directory of this candidate's per-chromosome plots, relative to the sample directory
    pub fn chromosome_dir(&self, sample: &str) -> Option<String> {
        self.detail_folder
            .as_ref()
            .map(|folder| format!("{}/{}", folder, sample))
    }
}

/// One per-chromosome plot filename with its parsed chromosome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChromosomeArtifact {
    pub file_name: String,
    pub label: String,
    pub rank: Option<u8>,
}

/// Everything a reviewer pages through for one sample
#[derive(Debug, Clone, Serialize)]
pub struct SampleCandidates {
    pub sample: String,
    /// Genome-wide candidates; the default (optimal) candidate comes first
    pub candidates: Vec<Candidate>,
    /// Per-chromosome plot names, in chromosome order
    pub chromosomes: Vec<ChromosomeArtifact>,
    /// Token of the pipeline's optimal solution when it was found among the candidates
    pub optimal: Option<SolutionToken>,
}

impl SampleCandidates {
    /// Load the candidate listing of `sample` under `data_path`
    pub fn load(data_path: &Path, sample: &str) -> Result<Self> {
        let sample_dir = data_path.join(sample);
        if !sample_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Sample folder {} does not exist",
                sample_dir.display()
            )));
        }

        let mut genome_wide: Vec<String> = sorted_files(&sample_dir)?
            .into_iter()
            .filter(|name| is_genome_wide_artifact(name))
            .collect();
        let optimal = promote_default(&sample_dir, &mut genome_wide);

        let candidates = genome_wide
            .into_iter()
            .map(|file_name| {
                let token = SolutionToken::from_filename(&file_name);
                let detail_folder = token
                    .as_ref()
                    .and_then(|t| find_solution_folder(&sample_dir, t));
                Candidate {
                    file_name,
                    token,
                    detail_folder,
                }
            })
            .collect();

        let chromosomes = chromosome_artifacts(&sample_dir)
            .into_iter()
            .map(|file_name| {
                let chromosome = Chromosome::from_filename(&file_name);
                ChromosomeArtifact {
                    label: chromosome.label(),
                    rank: chromosome.rank(),
                    file_name,
                }
            })
            .collect();

        Ok(Self {
            sample: sample.to_string(),
            candidates,
            chromosomes,
            optimal,
        })
    }

    /// The candidate shown first when the sample has no curation
    pub fn default_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// Per-chromosome plot names from the first directory that has any
///
/// Every solution renders the same set of chromosome plot names, so one
/// directory is enough to build the list.
fn chromosome_artifacts(sample_dir: &Path) -> Vec<String> {
    let walker = WalkDir::new(sample_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir());

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error accessing entry: {}", e);
                continue;
            }
        };

        let Ok(files) = sorted_files(entry.path()) else {
            continue;
        };
        let mut chromosomes: Vec<String> = files
            .into_iter()
            .filter(|name| is_chromosome_artifact(name))
            .collect();
        if !chromosomes.is_empty() {
            sort_chromosome_files(&mut chromosomes);
            return chromosomes;
        }
    }

    Vec::new()
}
