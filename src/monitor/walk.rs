//! Folder scan policy shared by the monitor and the orchestrator.
//!
//! Enumerates eligible C/C++ sources under a root, skipping hidden
//! directories and common build/dependency trees. Per-file failures are
//! recorded as skips rather than aborting the scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::hash;

/// Extensions treated as C/C++ source files.
pub const SOURCE_EXTENSIONS: &[&str] = &["cpp", "c", "h", "cc", "cxx"];

/// Directory names never descended into.
const EXCLUDED_DIRS: &[&str] = &["build", "cmake", "node_modules"];

/// A file that could not be hashed and was left out of the result map.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of hashing every eligible file under a folder.
#[derive(Debug, Default)]
pub struct FolderHashes {
    /// path -> content digest
    pub hashes: HashMap<String, String>,
    /// Files omitted from `hashes` (unreadable, racing deletion, ...).
    pub skipped: Vec<SkippedFile>,
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively enumerate eligible source files under `root`, in a stable
/// (file-name sorted) order.
pub fn collect_source_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // The root itself is always entered, whatever its name.
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !EXCLUDED_DIRS.contains(&name.as_ref())
        })
        .flatten()
    {
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files
}

/// Hash all eligible files under `root`.
pub fn hash_folder(root: &Path) -> FolderHashes {
    let mut result = FolderHashes::default();

    for path in collect_source_files(root) {
        match hash::digest_file(&path) {
            Ok(digest) => {
                result
                    .hashes
                    .insert(path.to_string_lossy().into_owned(), digest);
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unhashable file");
                result.skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"void f() {}\n").unwrap();
    }

    #[test]
    fn test_collects_only_recognized_extensions() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.cpp");
        touch(temp.path(), "b.c");
        touch(temp.path(), "c.h");
        touch(temp.path(), "d.cc");
        touch(temp.path(), "e.cxx");
        touch(temp.path(), "readme.md");
        touch(temp.path(), "f.py");

        let files = collect_source_files(temp.path());
        assert_eq!(files.len(), 5);
    }

    #[test]
    fn test_excludes_hidden_and_build_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/main.cpp");
        touch(temp.path(), ".git/ignored.cpp");
        touch(temp.path(), "build/generated.cpp");
        touch(temp.path(), "cmake/helper.cpp");
        touch(temp.path(), "node_modules/dep/dep.cpp");

        let files = collect_source_files(temp.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/main.cpp"));
    }

    #[test]
    fn test_recurses_into_nested_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a/b/c/deep.cpp");
        let files = collect_source_files(temp.path());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_hash_folder_maps_paths_to_digests() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "one.cpp");
        touch(temp.path(), "two.cpp");

        let result = hash_folder(temp.path());
        assert_eq!(result.hashes.len(), 2);
        assert!(result.skipped.is_empty());
        for digest in result.hashes.values() {
            assert_eq!(digest.len(), 64);
        }
    }

    #[test]
    fn test_hash_folder_on_empty_folder() {
        let temp = TempDir::new().unwrap();
        let result = hash_folder(temp.path());
        assert!(result.hashes.is_empty());
        assert!(result.skipped.is_empty());
    }
}
