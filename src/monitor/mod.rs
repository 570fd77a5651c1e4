//! Watched-project lifecycle: register, check, refresh, unregister.
//!
//! A watched project is a folder whose eligible source files are fingerprinted
//! into a stored hash snapshot. Checking re-hashes the folder and diffs
//! against the last *saved* snapshot, never against an in-memory scan.

mod diff;
pub mod hash;
pub mod walk;

use std::path::Path;

use serde::Serialize;

use crate::error::{Result, ScanError};
use crate::store::{Store, WatchedProject};

pub use diff::ChangeSet;
pub use walk::{FolderHashes, SkippedFile, SOURCE_EXTENSIONS};

/// Outcome of registering a folder for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredProject {
    pub id: i64,
    pub name: String,
    pub folder_path: String,
    pub files_tracked: usize,
}

/// Changes in a watched folder relative to its last saved snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub project_id: i64,
    pub project_name: String,
    pub folder_path: String,
    #[serde(flatten)]
    pub changes: ChangeSet,
    pub total_changes: usize,
}

/// Monitoring service over a persistence store.
pub struct Monitor<'a> {
    store: &'a Store,
}

impl<'a> Monitor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Register a folder and persist its initial hash snapshot.
    ///
    /// The folder is hashed before anything is written, so a folder with no
    /// eligible sources fails without leaving a project row behind.
    pub fn register(&self, folder: &Path) -> Result<RegisteredProject> {
        if !folder.exists() {
            return Err(ScanError::NotFound(folder.to_path_buf()));
        }

        let scan = walk::hash_folder(folder);
        if scan.hashes.is_empty() {
            return Err(ScanError::NoSourceFiles(folder.to_path_buf()));
        }

        let name = folder_name(folder);
        let id = self.store.add_watched_project(&name, folder)?;
        self.store.upsert_file_hashes(id, &scan.hashes)?;

        tracing::info!(project = %name, files = scan.hashes.len(), "registered watched project");
        Ok(RegisteredProject {
            id,
            name,
            folder_path: folder.to_string_lossy().into_owned(),
            files_tracked: scan.hashes.len(),
        })
    }

    /// Re-hash the folder and report changes since the last saved snapshot.
    /// Read-only: the stored snapshot is not touched.
    pub fn check(&self, project_id: i64) -> Result<ChangeReport> {
        let project = self.find(project_id)?;
        let stored = self.store.get_file_hashes(project_id)?;
        let current = walk::hash_folder(Path::new(&project.folder_path)).hashes;

        let changes = ChangeSet::diff(&stored, &current);
        Ok(ChangeReport {
            project_id,
            project_name: project.name,
            folder_path: project.folder_path,
            total_changes: changes.total_changes(),
            changes,
        })
    }

    /// Re-hash the folder and overwrite the stored snapshot unconditionally.
    /// Returns the number of files now tracked.
    pub fn refresh(&self, project_id: i64) -> Result<usize> {
        let project = self.find(project_id)?;
        let scan = walk::hash_folder(Path::new(&project.folder_path));
        self.store.replace_file_hashes(project_id, &scan.hashes)?;
        tracing::info!(project = %project.name, files = scan.hashes.len(), "refreshed hash snapshot");
        Ok(scan.hashes.len())
    }

    /// Stop watching a project. Cascades to its hash snapshot.
    pub fn unregister(&self, project_id: i64) -> Result<()> {
        if !self.store.remove_watched_project(project_id)? {
            return Err(ScanError::ProjectNotFound(project_id));
        }
        Ok(())
    }

    /// All watched projects, newest first.
    pub fn list(&self) -> Result<Vec<WatchedProject>> {
        self.store.get_watched_projects()
    }

    fn find(&self, project_id: i64) -> Result<WatchedProject> {
        self.store
            .get_watched_project(project_id)?
            .ok_or(ScanError::ProjectNotFound(project_id))
    }
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.to_string_lossy().into_owned())
}
