//! Integration tests for summary persistence and store hydration
//!
//! A summary written from a store and read back into a fresh store must
//! describe the same curations.

use curate_common::samples::list_samples;
use curate_common::summary::{build_summary, persist_summary, SUMMARY_FILE_NAME};
use curate_common::time::now;
use curate_common::{CurationStore, SummaryFormat};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_solution(data: &Path, sample: &str, folder: &str, tf: &str, ploidy: &str) {
    let dir = data.join(sample).join(folder);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{}.params.txt", sample)),
        format!("Sample\tTF\tPloidy\n{}\t{}\t{}\n", sample, tf, ploidy),
    )
    .unwrap();
}

#[test]
fn test_summary_round_trip_through_fresh_store() {
    let data = TempDir::new().unwrap();
    let backend = TempDir::new().unwrap();
    write_solution(data.path(), "S01", "S01_optimal_n0.3_p3", "0.2874", "3.02");
    write_solution(data.path(), "S01", "S01_n0.1_p2", "0.1021", "2.01");
    write_solution(data.path(), "S02", "S02_n0.2_p2", "0.2", "2");
    fs::create_dir_all(data.path().join("S03")).unwrap();

    let mut store = CurationStore::new();
    store.set_selection("P", "S01", "alice", "S01_genomeWide_n0.3-p3.pdf", now()).unwrap();
    store.set_selection("P", "S01", "bob", "S01_genomeWide_n0.1-p2.pdf", now()).unwrap();
    store.set_selection("P", "S02", "alice", "S02_genomeWide_n0.2-p2.pdf", now()).unwrap();

    let samples = list_samples(data.path()).unwrap();
    let lines = build_summary(&samples, &store, "P", data.path());
    let path = backend.path().join("P").join(SUMMARY_FILE_NAME);
    persist_summary(&lines, &path, SummaryFormat::default()).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let mut rows = content.lines();
    assert_eq!(
        rows.next(),
        Some("Sample Name\tCuration Status\tUser\tSolution Filename")
    );
    assert_eq!(
        rows.next(),
        Some("S01\tTumor Fraction 0.2874, Ploidy 3.02\talice\tS01_genomeWide_n0.3-p3.pdf")
    );
    assert_eq!(
        rows.next(),
        Some("S01\tTumor Fraction 0.1021, Ploidy 2.01\tbob\tS01_genomeWide_n0.1-p2.pdf")
    );
    assert_eq!(
        rows.next(),
        Some("S02\tTumor Fraction 0.2, Ploidy 2\talice\tS02_genomeWide_n0.2-p2.pdf")
    );
    assert_eq!(rows.next(), Some("S03\tNone\tNone\tNone"));
    assert_eq!(rows.next(), None);

    let mut fresh = CurationStore::new();
    assert_eq!(fresh.hydrate("P", &path).unwrap(), 3);

    for sample in &samples {
        assert_eq!(
            fresh.list_curated_users("P", sample),
            store.list_curated_users("P", sample)
        );
        for user in store.list_curated_users("P", sample) {
            assert_eq!(
                fresh.get("P", sample, &user).unwrap().artifact_id,
                store.get("P", sample, &user).unwrap().artifact_id
            );
        }
    }
}

#[test]
fn test_timestamp_column_survives_hydration() {
    let data = TempDir::new().unwrap();
    let backend = TempDir::new().unwrap();
    write_solution(data.path(), "S01", "S01_n0.3_p3", "0.3", "3");

    let stamp = now();
    let mut store = CurationStore::new();
    store.set_selection("P", "S01", "alice", "S01_genomeWide_n0.3-p3.pdf", stamp).unwrap();

    let samples = list_samples(data.path()).unwrap();
    let lines = build_summary(&samples, &store, "P", data.path());
    let path = backend.path().join(SUMMARY_FILE_NAME);
    let format = SummaryFormat {
        include_timestamp: true,
    };
    persist_summary(&lines, &path, format).unwrap();

    let mut fresh = CurationStore::new();
    fresh.hydrate("P", &path).unwrap();

    let record = fresh.get("P", "S01", "alice").unwrap();
    assert_eq!(
        record.timestamp.map(|t| t.timestamp_micros()),
        Some(stamp.timestamp_micros())
    );
}

#[test]
fn test_cleared_selection_disappears_from_summary() {
    let data = TempDir::new().unwrap();
    write_solution(data.path(), "S01", "S01_n0.3_p3", "0.3", "3");

    let mut store = CurationStore::new();
    store.set_selection("P", "S01", "alice", "S01_genomeWide_n0.3-p3.pdf", now()).unwrap();
    store.clear_selection("P", "S01", "alice");

    let samples = list_samples(data.path()).unwrap();
    let lines = build_summary(&samples, &store, "P", data.path());

    assert_eq!(lines.len(), 1);
    assert!(!lines[0].is_curated());
}

#[test]
fn test_refused_selection_cannot_forge_records() {
    let data = TempDir::new().unwrap();
    let backend = TempDir::new().unwrap();
    write_solution(data.path(), "S01", "S01_n0.1_p2", "0.1", "2");
    write_solution(data.path(), "S02", "S02_n0.1_p2", "0.1", "2");

    let mut store = CurationStore::new();
    store.set_selection("P", "S01", "alice", "S01_genomeWide_n0.1-p2.pdf", now()).unwrap();
    let forged = "x.pdf\nS02\tForged\tmallory\tS02_genomeWide_n0.1-p2.pdf";
    assert!(store.set_selection("P", "S01", "alice", forged, now()).is_err());
    assert!(store.set_selection("P", "S01", "bob", "a\tb_n0.1-p2.pdf", now()).is_err());

    let samples = list_samples(data.path()).unwrap();
    let lines = build_summary(&samples, &store, "P", data.path());
    let path = backend.path().join(SUMMARY_FILE_NAME);
    persist_summary(&lines, &path, SummaryFormat::default()).unwrap();

    let mut fresh = CurationStore::new();
    assert_eq!(fresh.hydrate("P", &path).unwrap(), 1);
    assert_eq!(fresh.list_curated_users("P", "S01"), vec!["alice"]);
    assert!(fresh.list_curated_users("P", "S02").is_empty());
    assert_eq!(
        fresh.get("P", "S01", "alice").unwrap().artifact_id,
        "S01_genomeWide_n0.1-p2.pdf"
    );
}
