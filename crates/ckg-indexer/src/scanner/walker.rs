//! File system walker that skips hidden entries.

use crate::IndexerError;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

/// A discovered file entry.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time as fractional seconds since the Unix epoch
    pub mtime: f64,
}

/// Deterministic directory walker.
///
/// Every file below the root is visited in file-name order, except hidden
/// files and anything under a hidden directory. Ignore files are not
/// consulted: a build indexes exactly what is on disk.
pub struct Walker {
    root: PathBuf,
}

impl Walker {
    /// Create a new walker for the given root directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Walk the directory tree and return all discovered files.
    pub fn walk(&self) -> Result<Vec<FileEntry>, IndexerError> {
        if !self.root.is_dir() {
            return Err(IndexerError::NotFound(self.root.clone()));
        }

        let walker = WalkBuilder::new(&self.root)
            .follow_links(false)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut entries = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    // Don't fail the entire walk for individual errors
                    debug!(error = %e, "Walk error");
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    debug!(path = ?entry.path(), error = %e, "Metadata unavailable");
                    continue;
                }
            };

            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);

            entries.push(FileEntry {
                path: entry.path().to_path_buf(),
                size: metadata.len(),
                mtime,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_walker_empty_directory() {
        let temp_dir = tempdir().unwrap();
        let walker = Walker::new(temp_dir.path());

        let entries = walker.walk().unwrap();
        assert_eq!(entries.len(), 0);
    }

    #[test]
    fn test_walker_missing_root() {
        let temp_dir = tempdir().unwrap();
        let walker = Walker::new(&temp_dir.path().join("absent"));
        assert!(matches!(walker.walk(), Err(IndexerError::NotFound(_))));
    }

    #[test]
    fn test_walker_skips_hidden_entries() {
        let temp_dir = tempdir().unwrap();

        File::create(temp_dir.path().join("visible.py")).unwrap();
        File::create(temp_dir.path().join(".hidden.py")).unwrap();
        fs::create_dir(temp_dir.path().join(".venv")).unwrap();
        File::create(temp_dir.path().join(".venv/lib.py")).unwrap();

        let walker = Walker::new(temp_dir.path());
        let entries = walker.walk().unwrap();

        let names: Vec<_> = entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["visible.py"]);
    }

    #[test]
    fn test_walker_ignores_gitignore() {
        let temp_dir = tempdir().unwrap();

        fs::write(temp_dir.path().join(".gitignore"), "build/\n").unwrap();
        fs::create_dir(temp_dir.path().join("build")).unwrap();
        File::create(temp_dir.path().join("build/out.rs")).unwrap();

        let entries = Walker::new(temp_dir.path()).walk().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.ends_with("build/out.rs"));
    }

    #[test]
    fn test_walker_handles_nested_directories() {
        let temp_dir = tempdir().unwrap();

        fs::create_dir_all(temp_dir.path().join("a/b/c")).unwrap();
        File::create(temp_dir.path().join("a/file1.txt")).unwrap();
        File::create(temp_dir.path().join("a/b/file2.txt")).unwrap();
        File::create(temp_dir.path().join("a/b/c/file3.txt")).unwrap();

        let entries = Walker::new(temp_dir.path()).walk().unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_walker_file_entry_has_metadata() {
        let temp_dir = tempdir().unwrap();

        let content = "hello world";
        fs::write(temp_dir.path().join("test.txt"), content).unwrap();

        let entries = Walker::new(temp_dir.path()).walk().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, content.len() as u64);
        assert!(entries[0].mtime > 0.0);
    }

    #[test]
    fn test_walker_results_are_sorted() {
        let temp_dir = tempdir().unwrap();

        File::create(temp_dir.path().join("c.txt")).unwrap();
        File::create(temp_dir.path().join("a.txt")).unwrap();
        File::create(temp_dir.path().join("b.txt")).unwrap();

        let entries = Walker::new(temp_dir.path()).walk().unwrap();

        let names: Vec<_> = entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }
}
