//! Lexical conventions of the copy-number pipeline output
//!
//! Genome-wide plots are named `<sample>_genomeWide_n<tf>-p<ploidy>.pdf`,
//! solution detail folders end with `n<tf>_p<ploidy>`, and per-chromosome
//! plots end with the chromosome name before `.pdf`
//! (`<sample>_CNA_chrchr7.pdf`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Substring marking a genome-wide candidate plot
pub const GENOME_WIDE_MARKER: &str = "genomeWide_n";

/// Substring marking a per-chromosome plot
pub const CHROMOSOME_MARKER: &str = "CNA_chrchr";

/// Substring marking the pipeline's preferred solution folder
pub const OPTIMAL_MARKER: &str = "optimal";

/// Extension of every rendered artifact
pub const ARTIFACT_EXTENSION: &str = ".pdf";

static FILE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"n([\d.]+)-p(\d+)\.pdf$").expect("file token regex"));

static FOLDER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"n([\d.]+)_p(\d+)$").expect("folder token regex"));

static CHROMOSOME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^0-9])([0-9]{1,2}|x|y)\.pdf$").expect("chromosome regex"));

/// Tumor fraction / ploidy pair identifying one solution candidate
///
/// Both values are kept as the strings found in the name, so tokens built
/// from a filename match folder names character for character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolutionToken {
    pub tumor_fraction: String,
    pub ploidy: String,
}

impl SolutionToken {
    pub fn new(tumor_fraction: impl Into<String>, ploidy: impl Into<String>) -> Self {
        Self {
            tumor_fraction: tumor_fraction.into(),
            ploidy: ploidy.into(),
        }
    }

    /// Parse the trailing `n<tf>-p<ploidy>.pdf` of an artifact filename
    pub fn from_filename(file_name: &str) -> Option<Self> {
        FILE_TOKEN
            .captures(file_name)
            .map(|caps| Self::new(&caps[1], &caps[2]))
    }

    /// Parse the trailing `n<tf>_p<ploidy>` of a solution folder name
    pub fn from_folder_name(folder_name: &str) -> Option<Self> {
        FOLDER_TOKEN
            .captures(folder_name)
            .map(|caps| Self::new(&caps[1], &caps[2]))
    }

    /// `n<tf>-p<ploidy>`, as embedded in artifact filenames
    pub fn file_token(&self) -> String {
        format!("n{}-p{}", self.tumor_fraction, self.ploidy)
    }

    /// `n<tf>_p<ploidy>`, as embedded in solution folder names
    pub fn folder_token(&self) -> String {
        format!("n{}_p{}", self.tumor_fraction, self.ploidy)
    }
}

impl fmt::Display for SolutionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_token())
    }
}

/// Convert an export selector to the form used by folder names
pub fn folder_selector(selector: &str) -> String {
    selector.replace('-', "_")
}

/// True for genome-wide candidate plot filenames
pub fn is_genome_wide_artifact(file_name: &str) -> bool {
    file_name.contains(GENOME_WIDE_MARKER) && file_name.ends_with(ARTIFACT_EXTENSION)
}

/// True for per-chromosome plot filenames
pub fn is_chromosome_artifact(file_name: &str) -> bool {
    file_name.contains(CHROMOSOME_MARKER) && file_name.ends_with(ARTIFACT_EXTENSION)
}

/// Chromosome named by a per-chromosome plot
///
/// Ordering is 1..22, then X, then Y, then anything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Chromosome {
    Autosome(u8),
    X,
    Y,
    Unknown,
}

impl Chromosome {
    /// Extract the chromosome from a filename ending in `<1-22|X|Y>.pdf`
    pub fn from_filename(file_name: &str) -> Self {
        let Some(caps) = CHROMOSOME.captures(file_name) else {
            return Chromosome::Unknown;
        };

        match &caps[1] {
            "x" | "X" => Chromosome::X,
            "y" | "Y" => Chromosome::Y,
            digits => match digits.parse::<u8>() {
                Ok(n) if (1..=22).contains(&n) => Chromosome::Autosome(n),
                _ => Chromosome::Unknown,
            },
        }
    }

    /// Numeric sort key: autosomes by number, X = 23, Y = 24, unknown = `None`
    pub fn rank(&self) -> Option<u8> {
        match self {
            Chromosome::Autosome(n) => Some(*n),
            Chromosome::X => Some(23),
            Chromosome::Y => Some(24),
            Chromosome::Unknown => None,
        }
    }

    /// Display label ("7", "X", "Y", or "?")
    pub fn label(&self) -> String {
        match self {
            Chromosome::Autosome(n) => n.to_string(),
            Chromosome::X => "X".to_string(),
            Chromosome::Y => "Y".to_string(),
            Chromosome::Unknown => "?".to_string(),
        }
    }
}

/// Display label of the chromosome named by `file_name`
pub fn chromosome_label(file_name: &str) -> String {
    Chromosome::from_filename(file_name).label()
}

/// Sort per-chromosome plot filenames into chromosome order (stable)
pub fn sort_chromosome_files(files: &mut [String]) {
    files.sort_by_key(|name| Chromosome::from_filename(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_filename() {
        let token = SolutionToken::from_filename("S01_genomeWide_n0.35-p3.pdf").unwrap();
        assert_eq!(token.tumor_fraction, "0.35");
        assert_eq!(token.ploidy, "3");
        assert_eq!(token.file_token(), "n0.35-p3");
        assert_eq!(token.folder_token(), "n0.35_p3");
    }

    #[test]
    fn test_token_from_filename_rejects_other_names() {
        assert!(SolutionToken::from_filename("S01_genomeWide.pdf").is_none());
        assert!(SolutionToken::from_filename("S01_genomeWide_n0.35-p3.png").is_none());
        assert!(SolutionToken::from_filename("S01_n0.35_p3").is_none());
    }

    #[test]
    fn test_token_from_folder_name() {
        let token = SolutionToken::from_folder_name("S01_optimal_n0.3_p3").unwrap();
        assert_eq!(token, SolutionToken::new("0.3", "3"));
        assert!(SolutionToken::from_folder_name("S01_n0.3_p3_extra").is_none());
    }

    #[test]
    fn test_long_tumor_fraction_is_not_truncated() {
        // Fixed-width slicing would cut this token short
        let token = SolutionToken::from_filename("S01_genomeWide_n0.125-p12.pdf").unwrap();
        assert_eq!(token.file_token(), "n0.125-p12");
    }

    #[test]
    fn test_folder_selector() {
        assert_eq!(folder_selector("n0.3-p3"), "n0.3_p3");
        assert_eq!(folder_selector("optimal"), "optimal");
    }

    #[test]
    fn test_artifact_classification() {
        assert!(is_genome_wide_artifact("S01_genomeWide_n0.1-p2.pdf"));
        assert!(!is_genome_wide_artifact("S01_genomeWide_n0.1-p2.png"));
        assert!(is_chromosome_artifact("S01_CNA_chrchr7.pdf"));
        assert!(!is_chromosome_artifact("S01_genomeWide_n0.1-p2.pdf"));
    }

    #[test]
    fn test_chromosome_from_filename() {
        assert_eq!(Chromosome::from_filename("S_CNA_chrchr1.pdf"), Chromosome::Autosome(1));
        assert_eq!(Chromosome::from_filename("S_CNA_chrchr22.pdf"), Chromosome::Autosome(22));
        assert_eq!(Chromosome::from_filename("S_CNA_chrchrX.pdf"), Chromosome::X);
        assert_eq!(Chromosome::from_filename("S_CNA_chrchry.pdf"), Chromosome::Y);
        assert_eq!(Chromosome::from_filename("S_CNA_chrchr23.pdf"), Chromosome::Unknown);
        assert_eq!(Chromosome::from_filename("S_CNA_chrchr0.pdf"), Chromosome::Unknown);
        assert_eq!(Chromosome::from_filename("S_CNA_chrchrM.pdf"), Chromosome::Unknown);
        assert_eq!(Chromosome::from_filename("S_CNA_chrchr7.png"), Chromosome::Unknown);
    }

    #[test]
    fn test_chromosome_rank_and_label() {
        assert_eq!(Chromosome::Autosome(10).rank(), Some(10));
        assert_eq!(Chromosome::X.rank(), Some(23));
        assert_eq!(Chromosome::Y.rank(), Some(24));
        assert_eq!(Chromosome::Unknown.rank(), None);
        assert_eq!(Chromosome::X.label(), "X");
        assert_eq!(Chromosome::Autosome(4).label(), "4");
    }

    #[test]
    fn test_chromosome_ordering() {
        let mut files: Vec<String> = ["3", "21", "X", "Y", "10"]
            .iter()
            .map(|c| format!("S01_CNA_chrchr{}.pdf", c))
            .collect();

        sort_chromosome_files(&mut files);

        let labels: Vec<String> = files.iter().map(|f| chromosome_label(f)).collect();
        assert_eq!(labels, vec!["3", "10", "21", "X", "Y"]);
    }

    #[test]
    fn test_unknown_chromosomes_sort_last() {
        let mut files = vec![
            "S01_CNA_chrchrM.pdf".to_string(),
            "S01_CNA_chrchrY.pdf".to_string(),
            "S01_CNA_chrchr2.pdf".to_string(),
        ];
        sort_chromosome_files(&mut files);
        assert_eq!(files.last().unwrap(), "S01_CNA_chrchrM.pdf");
        assert_eq!(files.first().unwrap(), "S01_CNA_chrchr2.pdf");
    }
}
