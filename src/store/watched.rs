//! Watched projects and their file-hash snapshots.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::error::{Result, ScanError};

use super::Store;

/// A folder registered for change monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct WatchedProject {
    pub id: i64,
    pub name: String,
    pub folder_path: String,
    pub registered_at: String,
}

impl Store {
    /// Register a folder. The uniqueness constraint on `folder_path` turns
    /// double-registration into a typed `DuplicateFolder` error.
    pub fn add_watched_project(&self, name: &str, folder_path: &Path) -> Result<i64> {
        let conn = self.connect()?;
        let path_str = folder_path.to_string_lossy().into_owned();

        match conn.execute(
            "INSERT INTO watched_projects (name, folder_path) VALUES (?1, ?2)",
            params![name, path_str],
        ) {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(ScanError::DuplicateFolder(folder_path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All watched projects, newest first.
    pub fn get_watched_projects(&self) -> Result<Vec<WatchedProject>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, folder_path, registered_at
             FROM watched_projects ORDER BY registered_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WatchedProject {
                id: row.get(0)?,
                name: row.get(1)?,
                folder_path: row.get(2)?,
                registered_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_watched_project(&self, project_id: i64) -> Result<Option<WatchedProject>> {
        let conn = self.connect()?;
        Ok(conn
            .query_row(
                "SELECT id, name, folder_path, registered_at
                 FROM watched_projects WHERE id = ?1",
                params![project_id],
                |row| {
                    Ok(WatchedProject {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        folder_path: row.get(2)?,
                        registered_at: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    /// Delete a watched project; cascades to its hash snapshot.
    /// Returns false when no such project exists.
    pub fn remove_watched_project(&self, project_id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let affected = conn.execute(
            "DELETE FROM watched_projects WHERE id = ?1",
            params![project_id],
        )?;
        Ok(affected > 0)
    }

    /// Upsert hashes into the snapshot; paths not in `hashes` are untouched.
    pub fn upsert_file_hashes(
        &self,
        project_id: i64,
        hashes: &HashMap<String, String>,
    ) -> Result<()> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "INSERT INTO file_hashes (project_id, file_path, file_hash)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(project_id, file_path)
             DO UPDATE SET file_hash = excluded.file_hash,
                           hashed_at = CURRENT_TIMESTAMP",
        )?;
        for (file_path, file_hash) in hashes {
            stmt.execute(params![project_id, file_path, file_hash])?;
        }
        Ok(())
    }

    /// Make the stored snapshot exactly equal to `hashes`: upserts every
    /// current path and drops rows for files that no longer exist.
    pub fn replace_file_hashes(
        &self,
        project_id: i64,
        hashes: &HashMap<String, String>,
    ) -> Result<()> {
        self.upsert_file_hashes(project_id, hashes)?;

        let stale: Vec<String> = self
            .get_file_hashes(project_id)?
            .into_keys()
            .filter(|path| !hashes.contains_key(path))
            .collect();

        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("DELETE FROM file_hashes WHERE project_id = ?1 AND file_path = ?2")?;
        for path in stale {
            stmt.execute(params![project_id, path])?;
        }
        Ok(())
    }

    /// The last saved snapshot for a project.
    pub fn get_file_hashes(&self, project_id: i64) -> Result<HashMap<String, String>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT file_path, file_hash FROM file_hashes WHERE project_id = ?1")?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(temp: &TempDir) -> Store {
        Store::open(temp.path().join("ccure.db")).unwrap()
    }

    fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_duplicate_folder_is_typed() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        store
            .add_watched_project("proj", Path::new("/proj"))
            .unwrap();
        let err = store
            .add_watched_project("proj", Path::new("/proj"))
            .unwrap_err();
        assert!(matches!(err, ScanError::DuplicateFolder(_)));
    }

    #[test]
    fn test_upsert_overwrites_existing_hash() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        let id = store.add_watched_project("p", Path::new("/p")).unwrap();

        store
            .upsert_file_hashes(id, &map(&[("/p/a.cpp", "h1")]))
            .unwrap();
        store
            .upsert_file_hashes(id, &map(&[("/p/a.cpp", "h2")]))
            .unwrap();

        let stored = store.get_file_hashes(id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored["/p/a.cpp"], "h2");
    }

    #[test]
    fn test_replace_drops_stale_rows() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        let id = store.add_watched_project("p", Path::new("/p")).unwrap();

        store
            .upsert_file_hashes(id, &map(&[("/p/a.cpp", "h1"), ("/p/b.cpp", "h2")]))
            .unwrap();
        store
            .replace_file_hashes(id, &map(&[("/p/a.cpp", "h3")]))
            .unwrap();

        let stored = store.get_file_hashes(id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored["/p/a.cpp"], "h3");
    }

    #[test]
    fn test_removing_project_cascades_to_hashes() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        let id = store.add_watched_project("p", Path::new("/p")).unwrap();
        store
            .upsert_file_hashes(id, &map(&[("/p/a.cpp", "h1")]))
            .unwrap();

        assert!(store.remove_watched_project(id).unwrap());
        assert!(!store.remove_watched_project(id).unwrap());

        let conn = store.connect().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM file_hashes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_snapshots_are_scoped_per_project() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        let p1 = store.add_watched_project("one", Path::new("/one")).unwrap();
        let p2 = store.add_watched_project("two", Path::new("/two")).unwrap();

        store
            .upsert_file_hashes(p1, &map(&[("/one/a.cpp", "h1")]))
            .unwrap();
        store
            .upsert_file_hashes(p2, &map(&[("/two/a.cpp", "h2")]))
            .unwrap();

        assert_eq!(store.get_file_hashes(p1).unwrap().len(), 1);
        assert_eq!(store.get_file_hashes(p2).unwrap()["/two/a.cpp"], "h2");
    }
}
