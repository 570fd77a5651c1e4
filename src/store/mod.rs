//! SQLite persistence for analyses and watched projects.
//!
//! The store keeps no open connection: every call opens, runs one statement
//! or a short sequence, and closes. There is no transaction spanning the
//! orchestration loop, which is what makes the scan's fail-fast policy leave
//! earlier rows persisted.

mod analyses;
mod watched;

use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::Result;

pub use analyses::{
    AnalysisEntry, ConfidenceBins, CweCount, DashboardStats, FileRatio, FunctionRow, Kpis,
    SeverityCount, StoredFile, StoredReport,
};
pub use watched::WatchedProject;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS analyses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp    DATETIME DEFAULT CURRENT_TIMESTAMP,
    project_name TEXT NOT NULL,
    project_path TEXT
);
CREATE TABLE IF NOT EXISTS files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id INTEGER NOT NULL,
    file_path   TEXT NOT NULL,
    FOREIGN KEY(analysis_id) REFERENCES analyses(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS functions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id       INTEGER NOT NULL,
    function_name TEXT NOT NULL,
    code          TEXT NOT NULL,
    verdict       TEXT NOT NULL,
    cwe           TEXT,
    cwe_name      TEXT,
    severity      TEXT,
    confidence    REAL,
    start_line    INTEGER,
    end_line      INTEGER,
    FOREIGN KEY(file_id) REFERENCES files(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS watched_projects (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    folder_path   TEXT NOT NULL UNIQUE,
    registered_at DATETIME DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS file_hashes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    file_path  TEXT NOT NULL,
    file_hash  TEXT NOT NULL,
    hashed_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(project_id, file_path),
    FOREIGN KEY(project_id) REFERENCES watched_projects(id) ON DELETE CASCADE
);
"#;

/// Handle to the SQLite database file.
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database and ensure the schema exists.
    /// Safe to call repeatedly.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)?;
        Ok(store)
    }

    pub(crate) fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}
