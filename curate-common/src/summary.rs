//! Curation summary: derivation, file format, and project progress
//!
//! The summary file is the only durable record of curation history. It is
//! UTF-8 text with a header line followed by one tab-separated line per
//! (sample, user) curation, or one `None` line per uncurated sample:
//!
//! ```text
//! Sample Name\tCuration Status\tUser\tSolution Filename
//! S01\tTumor Fraction 0.2874, Ploidy 3.02\talice\tS01_genomeWide_n0.3-p3.pdf
//! S02\tNone\tNone\tNone
//! ```
//!
//! An optional fifth `Curation Timestamp` column carries RFC 3339 record
//! timestamps. Readers accept files with or without it.

use crate::curation::CurationStore;
use crate::fs_util::write_atomic;
use crate::naming::SolutionToken;
use crate::resolver::resolve_solution_params;
use crate::samples::count_samples;
use crate::time::{format_timestamp, parse_timestamp};
use crate::{Error, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// File name of a project's summary, both in the backend folder and in exports
pub const SUMMARY_FILE_NAME: &str = "curation_summary.txt";

/// Placeholder for an absent field
pub const NONE_FIELD: &str = "None";

/// Status written when a curated artifact's params cannot be resolved
pub const METADATA_NOT_FOUND_STATUS: &str = "Metadata Not Found";

const HEADER_COLUMNS: [&str; 4] = ["Sample Name", "Curation Status", "User", "Solution Filename"];
const TIMESTAMP_COLUMN: &str = "Curation Timestamp";

/// Column layout used when writing a summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryFormat {
    /// Append the `Curation Timestamp` column
    pub include_timestamp: bool,
}

impl SummaryFormat {
    pub fn header(&self) -> String {
        let mut header = HEADER_COLUMNS.join("\t");
        if self.include_timestamp {
            header.push('\t');
            header.push_str(TIMESTAMP_COLUMN);
        }
        header
    }
}

/// One line of the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub sample: String,
    /// `None`, `Tumor Fraction <tf>, Ploidy <p>`, or `Metadata Not Found`
    pub status: String,
    pub user: String,
    pub artifact: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl SummaryLine {
    /// The single line emitted for a sample nobody has curated
    pub fn uncurated(sample: &str) -> Self {
        Self {
            sample: sample.to_string(),
            status: NONE_FIELD.to_string(),
            user: NONE_FIELD.to_string(),
            artifact: NONE_FIELD.to_string(),
            timestamp: None,
        }
    }

    pub fn is_curated(&self) -> bool {
        self.status != NONE_FIELD
    }

    fn render(&self, format: SummaryFormat) -> String {
        let mut line = format!(
            "{}\t{}\t{}\t{}",
            self.sample, self.status, self.user, self.artifact
        );
        if format.include_timestamp {
            line.push('\t');
            match &self.timestamp {
                Some(ts) => line.push_str(&format_timestamp(ts)),
                None => line.push_str(NONE_FIELD),
            }
        }
        line
    }
}

/// Reject a value that cannot be stored in one summary field
///
/// Tabs and line breaks would split the field or the line, so the file
/// would no longer parse back to the records it was written from. Other
/// control characters are refused along with them.
pub fn validate_summary_field(value: &str, what: &str) -> Result<()> {
    if value.chars().any(char::is_control) {
        return Err(Error::InvalidInput(format!(
            "{} {:?} contains a tab, line break, or other control character",
            what, value
        )));
    }
    Ok(())
}

/// Derive the summary of `project` for `samples` (in the given order)
///
/// Curated samples get one line per user in curation order; the status is
/// resolved against the params files under `data_path` at call time, so
/// upstream metadata changes show up immediately. A record whose params
/// cannot be resolved is kept with the `Metadata Not Found` status.
pub fn build_summary(
    samples: &[String],
    store: &CurationStore,
    project: &str,
    data_path: &Path,
) -> Vec<SummaryLine> {
    let mut lines = Vec::with_capacity(samples.len());

    for sample in samples {
        let before = lines.len();
        for (user, record) in store.records_for(project, sample) {
            lines.push(SummaryLine {
                sample: sample.clone(),
                status: resolve_status(data_path, sample, &record.artifact_id),
                user: user.to_string(),
                artifact: record.artifact_id.clone(),
                timestamp: record.timestamp,
            });
        }
        if lines.len() == before {
            lines.push(SummaryLine::uncurated(sample));
        }
    }

    lines
}

fn resolve_status(data_path: &Path, sample: &str, artifact_id: &str) -> String {
    let Some(token) = SolutionToken::from_filename(artifact_id) else {
        warn!(
            "Curated artifact '{}' of sample '{}' carries no solution token",
            artifact_id, sample
        );
        return METADATA_NOT_FOUND_STATUS.to_string();
    };

    match resolve_solution_params(&data_path.join(sample), sample, &token) {
        Ok(params) => params.display_status(),
        Err(e) => {
            warn!("{}", e);
            METADATA_NOT_FOUND_STATUS.to_string()
        }
    }
}

/// Render the full summary file content
pub fn render_summary(lines: &[SummaryLine], format: SummaryFormat) -> String {
    let mut content = format.header();
    content.push('\n');
    for line in lines {
        content.push_str(&line.render(format));
        content.push('\n');
    }
    content
}

/// Overwrite `path` with the summary; the parent directory is created if missing
pub fn persist_summary(lines: &[SummaryLine], path: &Path, format: SummaryFormat) -> Result<()> {
    write_atomic(path, render_summary(lines, format).as_bytes())?;
    tracing::info!("Summary with {} lines written to {}", lines.len(), path.display());
    Ok(())
}

/// Parse summary file content
///
/// The header line, blank lines, and lines with fewer than four fields are
/// skipped. A fifth field, when present, is read as the record timestamp.
pub fn parse_summary(content: &str) -> Vec<SummaryLine> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let raw = raw.trim_end_matches('\r');
            if raw.trim().is_empty() || (index == 0 && raw.starts_with(HEADER_COLUMNS[0])) {
                return None;
            }

            let fields: Vec<&str> = raw.split('\t').collect();
            if fields.len() < 4 {
                warn!("Skipping malformed summary line {}: {:?}", index + 1, raw);
                return None;
            }

            Some(SummaryLine {
                sample: fields[0].to_string(),
                status: fields[1].to_string(),
                user: fields[2].to_string(),
                artifact: fields[3].to_string(),
                timestamp: fields.get(4).and_then(|ts| parse_timestamp(ts)),
            })
        })
        .collect()
}

/// Curation progress of one project, read from its persisted summary
#[derive(Debug, Clone, Serialize)]
pub struct ProjectProgress {
    pub sample_count: usize,
    /// Distinct samples with at least one curation
    pub curated_samples: usize,
    /// Distinct curating users, sorted
    pub curating_users: Vec<String>,
    /// Modification time of the summary file
    pub latest_update: Option<DateTime<Local>>,
}

impl ProjectProgress {
    /// Gather progress from the data tree and the summary file
    ///
    /// A missing summary file means nothing has been curated yet.
    pub fn collect(data_path: &Path, summary_path: &Path) -> Self {
        let mut curated = BTreeSet::new();
        let mut users = BTreeSet::new();

        if let Ok(content) = fs::read_to_string(summary_path) {
            for line in parse_summary(&content).into_iter().filter(|l| l.is_curated()) {
                curated.insert(line.sample);
                users.insert(line.user);
            }
        }

        let latest_update = fs::metadata(summary_path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);

        Self {
            sample_count: count_samples(data_path),
            curated_samples: curated.len(),
            curating_users: users.into_iter().collect(),
            latest_update,
        }
    }
}
