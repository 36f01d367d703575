//! Filesystem helpers: sorted directory listings and atomic whole-file writes
//!
//! Registry and summary files are shared between reviewer sessions without
//! locking. Each write goes to a sibling `<name>.tmp` file which is then
//! renamed over the target, so readers see either the old or the new
//! content, never a partial file. Concurrent writers resolve last-write-wins.

use crate::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Names of the immediate subdirectories of `dir`, sorted by name
///
/// Entries whose names are not valid UTF-8 are skipped.
pub fn sorted_subdirectories(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Names of the regular files directly inside `dir`, sorted by name
pub fn sorted_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Path of the temporary sibling used while writing `target`
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Write `contents` to `target` atomically, creating the parent directory if needed
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(target);
    let write_result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    tracing::debug!("Wrote {} bytes to {}", contents.len(), target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_is_sibling() {
        let target = PathBuf::from("/backend/proj/curation_summary.txt");
        assert_eq!(
            temp_path_for(&target),
            PathBuf::from("/backend/proj/curation_summary.txt.tmp")
        );
    }

    #[test]
    fn test_write_creates_parent_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("out.txt");

        write_atomic(&target, b"hello").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
        assert!(!temp_path_for(&target).exists());
    }

    #[test]
    fn test_sorted_listings_split_files_and_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b_dir")).unwrap();
        fs::create_dir(dir.path().join("a_dir")).unwrap();
        fs::write(dir.path().join("z.txt"), "").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();

        assert_eq!(sorted_subdirectories(dir.path()).unwrap(), vec!["a_dir", "b_dir"]);
        assert_eq!(sorted_files(dir.path()).unwrap(), vec!["c.txt", "z.txt"]);
    }

    #[test]
    fn test_write_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.txt");

        write_atomic(&target, b"a much longer first version").unwrap();
        write_atomic(&target, b"short").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "short");
    }
}
