//! Curation state store
//!
//! Maps (project, sample, user) to the artifact that user selected for the
//! sample. A store is owned by one reviewer session; it is hydrated from a
//! project's summary file the first time the project is touched and is the
//! source of truth for that session afterwards.
//!
//! Records keep insertion order. Re-curating keeps the user's position and
//! clearing a record does not reorder the others, so summary lines come out
//! in the order reviewers first curated.

use crate::summary::{parse_summary, validate_summary_field, NONE_FIELD};
use crate::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Identity of one curation record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurationKey {
    pub project: String,
    pub sample: String,
    pub user: String,
}

impl CurationKey {
    pub fn new(project: &str, sample: &str, user: &str) -> Self {
        Self {
            project: project.to_string(),
            sample: sample.to_string(),
            user: user.to_string(),
        }
    }
}

/// What a user selected for a sample, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurationRecord {
    /// Genome-wide artifact filename of the chosen solution
    pub artifact_id: String,
    /// `None` for records hydrated from a summary file without a timestamp column
    pub timestamp: Option<DateTime<Utc>>,
}

/// In-memory curation state for every project a session has touched
#[derive(Debug, Clone, Default)]
pub struct CurationStore {
    records: IndexMap<CurationKey, CurationRecord>,
    hydrated: HashSet<String>,
}

impl CurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `project` has been loaded from its summary file in this store
    pub fn is_hydrated(&self, project: &str) -> bool {
        self.hydrated.contains(project)
    }

    /// Load `project` from its summary file, replacing any in-memory records
    ///
    /// A missing file is the normal never-curated case and yields an empty
    /// project. Lines whose status is `None` are skipped. Returns the number
    /// of records loaded.
    pub fn hydrate(&mut self, project: &str, summary_path: &Path) -> Result<usize> {
        let content = match fs::read_to_string(summary_path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        self.records.retain(|key, _| key.project != project);
        self.hydrated.insert(project.to_string());

        let Some(content) = content else {
            debug!(
                "No summary file for project '{}' at {}",
                project,
                summary_path.display()
            );
            return Ok(0);
        };

        let mut loaded = 0;
        for line in parse_summary(&content) {
            if line.status == NONE_FIELD {
                continue;
            }
            self.records.insert(
                CurationKey::new(project, &line.sample, &line.user),
                CurationRecord {
                    artifact_id: line.artifact,
                    timestamp: line.timestamp,
                },
            );
            loaded += 1;
        }

        info!(
            "Hydrated {} curation records for project '{}' from {}",
            loaded,
            project,
            summary_path.display()
        );
        Ok(loaded)
    }

    /// Hydrate `project` unless this store already holds it
    pub fn ensure_hydrated(&mut self, project: &str, summary_path: &Path) -> Result<()> {
        if !self.is_hydrated(project) {
            self.hydrate(project, summary_path)?;
        }
        Ok(())
    }

    /// Record `user`'s selection for `sample`, overwriting their previous one
    ///
    /// The artifact is not checked against the filesystem here; export and
    /// summary generation resolve it when they need it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`](crate::Error::InvalidInput) if the sample,
    /// user, or artifact holds a character that cannot be written to a
    /// summary field. The store is unchanged then.
    pub fn set_selection(
        &mut self,
        project: &str,
        sample: &str,
        user: &str,
        artifact_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        validate_summary_field(sample, "Sample")?;
        validate_summary_field(user, "User")?;
        validate_summary_field(artifact_id, "Artifact")?;

        self.records.insert(
            CurationKey::new(project, sample, user),
            CurationRecord {
                artifact_id: artifact_id.to_string(),
                timestamp: Some(timestamp),
            },
        );
        info!(
            "Curation recorded: project='{}' sample='{}' user='{}' artifact='{}'",
            project, sample, user, artifact_id
        );
        Ok(())
    }

    /// Remove `user`'s selection for `sample`; other users' records are untouched
    pub fn clear_selection(
        &mut self,
        project: &str,
        sample: &str,
        user: &str,
    ) -> Option<CurationRecord> {
        let removed = self
            .records
            .shift_remove(&CurationKey::new(project, sample, user));
        if removed.is_some() {
            info!(
                "Curation cleared: project='{}' sample='{}' user='{}'",
                project, sample, user
            );
        }
        removed
    }

    /// The record of one user for one sample
    pub fn get(&self, project: &str, sample: &str, user: &str) -> Option<&CurationRecord> {
        self.records.get(&CurationKey::new(project, sample, user))
    }

    /// Records of a sample as (user, record), in curation order
    pub fn records_for<'a>(
        &'a self,
        project: &'a str,
        sample: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a CurationRecord)> + 'a {
        self.records
            .iter()
            .filter(move |(key, _)| key.project == project && key.sample == sample)
            .map(|(key, record)| (key.user.as_str(), record))
    }

    /// Users who curated `sample`, in curation order
    pub fn list_curated_users(&self, project: &str, sample: &str) -> Vec<String> {
        self.records_for(project, sample)
            .map(|(user, _)| user.to_string())
            .collect()
    }

    pub fn has_any_curation(&self, project: &str, sample: &str) -> bool {
        self.records_for(project, sample).next().is_some()
    }

    /// Number of records held for `project`
    pub fn record_count(&self, project: &str) -> usize {
        self.records
            .keys()
            .filter(|key| key.project == project)
            .count()
    }

    /// Forget everything about `project`, including that it was hydrated
    pub fn drop_project(&mut self, project: &str) {
        self.records.retain(|key, _| key.project != project);
        self.hydrated.remove(project);
    }

    /// Re-key `old` records under `new`, keeping their order
    pub fn rename_project(&mut self, old: &str, new: &str) {
        let records = std::mem::take(&mut self.records);
        self.records = records
            .into_iter()
            .map(|(mut key, record)| {
                if key.project == old {
                    key.project = new.to_string();
                }
                (key, record)
            })
            .collect();

        if self.hydrated.remove(old) {
            self.hydrated.insert(new.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;
    use tempfile::TempDir;

    #[test]
    fn test_users_are_independent() {
        let mut store = CurationStore::new();
        store.set_selection("P", "sampleA", "userX", "a_n0.1-p2.pdf", now()).unwrap();
        store.set_selection("P", "sampleA", "userY", "a_n0.3-p3.pdf", now()).unwrap();

        assert_eq!(store.list_curated_users("P", "sampleA"), vec!["userX", "userY"]);

        store.clear_selection("P", "sampleA", "userX");

        assert_eq!(store.list_curated_users("P", "sampleA"), vec!["userY"]);
        assert_eq!(
            store.get("P", "sampleA", "userY").unwrap().artifact_id,
            "a_n0.3-p3.pdf"
        );
        assert!(store.has_any_curation("P", "sampleA"));
    }

    #[test]
    fn test_recuration_overwrites_in_place() {
        let mut store = CurationStore::new();
        store.set_selection("P", "S", "alice", "first.pdf", now()).unwrap();
        store.set_selection("P", "S", "bob", "other.pdf", now()).unwrap();
        store.set_selection("P", "S", "alice", "second.pdf", now()).unwrap();

        assert_eq!(store.list_curated_users("P", "S"), vec!["alice", "bob"]);
        assert_eq!(store.get("P", "S", "alice").unwrap().artifact_id, "second.pdf");
        assert_eq!(store.record_count("P"), 2);
    }

    #[test]
    fn test_separator_characters_are_rejected() {
        let mut store = CurationStore::new();

        let forged = "x.pdf\nS02\tForged\tmallory\tS02_genomeWide_n0.1-p2.pdf";
        assert!(matches!(
            store.set_selection("P", "S01", "alice", forged, now()),
            Err(crate::Error::InvalidInput(_))
        ));
        assert!(store
            .set_selection("P", "S01", "alice", "a\tb_n0.1-p2.pdf", now())
            .is_err());
        assert!(store
            .set_selection("P", "S01", "al\rice", "S01_genomeWide_n0.1-p2.pdf", now())
            .is_err());
        assert!(store
            .set_selection("P", "S\n01", "alice", "S01_genomeWide_n0.1-p2.pdf", now())
            .is_err());

        assert_eq!(store.record_count("P"), 0);
        assert!(!store.has_any_curation("P", "S02"));
    }

    #[test]
    fn test_clear_missing_record_is_noop() {
        let mut store = CurationStore::new();
        store.set_selection("P", "S", "alice", "first.pdf", now()).unwrap();

        assert!(store.clear_selection("P", "S", "bob").is_none());
        assert!(store.clear_selection("P", "other", "alice").is_none());
        assert_eq!(store.record_count("P"), 1);
    }

    #[test]
    fn test_projects_are_separate() {
        let mut store = CurationStore::new();
        store.set_selection("P1", "S", "alice", "one.pdf", now()).unwrap();

        assert!(store.has_any_curation("P1", "S"));
        assert!(!store.has_any_curation("P2", "S"));
    }

    #[test]
    fn test_hydrate_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = CurationStore::new();

        let loaded = store
            .hydrate("P", &dir.path().join("P").join("curation_summary.txt"))
            .unwrap();

        assert_eq!(loaded, 0);
        assert!(store.is_hydrated("P"));
    }

    #[test]
    fn test_hydrate_skips_none_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("curation_summary.txt");
        fs::write(
            &path,
            "Sample Name\tCuration Status\tUser\tSolution Filename\n\
             S01\tTumor Fraction 0.3, Ploidy 3\talice\tS01_genomeWide_n0.3-p3.pdf\n\
             S02\tNone\tNone\tNone\n",
        )
        .unwrap();

        let mut store = CurationStore::new();
        assert_eq!(store.hydrate("P", &path).unwrap(), 1);
        assert!(store.has_any_curation("P", "S01"));
        assert!(!store.has_any_curation("P", "S02"));
        assert_eq!(store.get("P", "S01", "alice").unwrap().timestamp, None);
    }

    #[test]
    fn test_ensure_hydrated_keeps_session_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("curation_summary.txt");

        let mut store = CurationStore::new();
        store.ensure_hydrated("P", &path).unwrap();
        store.set_selection("P", "S", "alice", "x.pdf", now()).unwrap();

        // A second touch must not reload from disk and lose the unsaved record
        store.ensure_hydrated("P", &path).unwrap();
        assert!(store.has_any_curation("P", "S"));
    }

    #[test]
    fn test_rename_and_drop_project() {
        let mut store = CurationStore::new();
        store.set_selection("old", "S", "alice", "x.pdf", now()).unwrap();
        store.set_selection("other", "S", "bob", "y.pdf", now()).unwrap();
        store.hydrated.insert("old".to_string());

        store.rename_project("old", "new");

        assert!(store.has_any_curation("new", "S"));
        assert!(!store.has_any_curation("old", "S"));
        assert!(store.is_hydrated("new"));
        assert!(!store.is_hydrated("old"));

        store.drop_project("new");
        assert_eq!(store.record_count("new"), 0);
        assert_eq!(store.record_count("other"), 1);
    }
}
