//! Analysis, file, and function rows: writes, history, reports, aggregates.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::classify::Classification;
use crate::error::{Result, ScanError};
use crate::extract::FunctionRecord;

use super::Store;

/// One entry in the analysis history listing.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisEntry {
    pub id: i64,
    pub project_name: String,
    pub project_path: Option<String>,
    pub timestamp: String,
    pub total_functions: i64,
    pub vuln_count: i64,
}

/// A persisted function row, as stored.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionRow {
    pub function_name: String,
    pub code: String,
    pub verdict: String,
    pub cwe: Option<String>,
    pub cwe_name: Option<String>,
    pub severity: Option<String>,
    pub confidence: Option<f64>,
    pub start_line: i64,
    pub end_line: i64,
}

/// One scanned file with its persisted functions.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub file_path: String,
    pub functions: Vec<FunctionRow>,
}

/// Full analysis -> files -> functions tree for one stored analysis.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReport {
    pub id: i64,
    pub project_name: String,
    pub project_path: Option<String>,
    pub timestamp: String,
    pub files: Vec<StoredFile>,
}

/// Headline totals across everything ever scanned.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub total_analyses: i64,
    pub total_files: i64,
    pub total_functions: i64,
    pub total_vulnerable: i64,
    pub total_safe: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CweCount {
    pub cwe: String,
    pub cwe_name: Option<String>,
    pub severity: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityCount {
    pub severity: String,
    pub count: i64,
}

/// Safe/vulnerable split for one recently scanned file.
#[derive(Debug, Clone, Serialize)]
pub struct FileRatio {
    pub label: String,
    pub safe: i64,
    pub vuln: i64,
}

/// Histogram of classifier confidence values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfidenceBins {
    pub bin_0_50: i64,
    pub bin_50_70: i64,
    pub bin_70_90: i64,
    pub bin_90_100: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub kpis: Kpis,
    pub cwe_counts: Vec<CweCount>,
    pub severity_counts: Vec<SeverityCount>,
    pub file_ratios: Vec<FileRatio>,
    pub confidence_bins: ConfidenceBins,
    pub recent_analyses: Vec<AnalysisEntry>,
}

impl Store {
    /// Record a new scan. Returns the analysis id.
    pub fn save_analysis(&self, project_name: &str, project_path: &str) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO analyses (project_name, project_path) VALUES (?1, ?2)",
            params![project_name, project_path],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a scanned file under an analysis. Returns the file id.
    pub fn save_file(&self, analysis_id: i64, file_path: &str) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO files (analysis_id, file_path) VALUES (?1, ?2)",
            params![analysis_id, file_path],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Persist one classified function under a file.
    pub fn save_function(
        &self,
        file_id: i64,
        record: &FunctionRecord,
        classification: &Classification,
    ) -> Result<()> {
        let (cwe, cwe_name, severity, confidence) = match classification {
            Classification::Safe => (None, None, None, None),
            Classification::Vulnerable {
                cwe,
                cwe_name,
                severity,
                confidence,
                ..
            } => (
                Some(cwe.as_str()),
                Some(cwe_name.as_str()),
                Some(severity.as_str()),
                Some(*confidence),
            ),
        };

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO functions
                 (file_id, function_name, code, verdict, cwe, cwe_name,
                  severity, confidence, start_line, end_line)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                file_id,
                record.name,
                record.code,
                classification.verdict().as_str(),
                cwe,
                cwe_name,
                severity,
                confidence,
                record.start_line as i64,
                record.end_line as i64,
            ],
        )?;
        Ok(())
    }

    /// Every analysis with its function totals, newest first.
    pub fn get_all_analyses(&self) -> Result<Vec<AnalysisEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT
                 a.id, a.project_name, a.project_path, a.timestamp,
                 COUNT(f.id) AS total_functions,
                 SUM(CASE WHEN f.verdict = 'vulnerable' THEN 1 ELSE 0 END) AS vuln_count
             FROM analyses a
             LEFT JOIN files fi ON fi.analysis_id = a.id
             LEFT JOIN functions f ON f.file_id = fi.id
             GROUP BY a.id
             ORDER BY a.timestamp DESC, a.id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(AnalysisEntry {
                id: row.get(0)?,
                project_name: row.get(1)?,
                project_path: row.get(2)?,
                timestamp: row.get(3)?,
                total_functions: row.get(4)?,
                vuln_count: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Retrieve the full stored report for one analysis.
    pub fn get_report(&self, analysis_id: i64) -> Result<StoredReport> {
        let conn = self.connect()?;

        let header = conn
            .query_row(
                "SELECT id, project_name, project_path, timestamp
                 FROM analyses WHERE id = ?1",
                params![analysis_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?
            .ok_or(ScanError::AnalysisNotFound(analysis_id))?;

        let mut files_stmt =
            conn.prepare("SELECT id, file_path FROM files WHERE analysis_id = ?1 ORDER BY id")?;
        let file_rows = files_stmt
            .query_map(params![analysis_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut fn_stmt = conn.prepare(
            "SELECT function_name, code, verdict, cwe, cwe_name,
                    severity, confidence, start_line, end_line
             FROM functions WHERE file_id = ?1 ORDER BY id",
        )?;

        let mut files = Vec::with_capacity(file_rows.len());
        for (file_id, file_path) in file_rows {
            let functions = fn_stmt
                .query_map(params![file_id], |row| {
                    Ok(FunctionRow {
                        function_name: row.get(0)?,
                        code: row.get(1)?,
                        verdict: row.get(2)?,
                        cwe: row.get(3)?,
                        cwe_name: row.get(4)?,
                        severity: row.get(5)?,
                        confidence: row.get(6)?,
                        start_line: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
                        end_line: row.get::<_, Option<i64>>(8)?.unwrap_or(0),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            files.push(StoredFile {
                file_path,
                functions,
            });
        }

        Ok(StoredReport {
            id: header.0,
            project_name: header.1,
            project_path: header.2,
            timestamp: header.3,
            files,
        })
    }

    /// Delete an analysis; cascades through files to functions.
    /// Returns false when no such analysis exists.
    pub fn delete_analysis(&self, analysis_id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let affected = conn.execute("DELETE FROM analyses WHERE id = ?1", params![analysis_id])?;
        Ok(affected > 0)
    }

    /// Aggregate statistics across all stored analyses.
    pub fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        let conn = self.connect()?;

        let kpis = conn.query_row(
            "SELECT
                 COUNT(DISTINCT a.id),
                 COUNT(DISTINCT fi.id),
                 COUNT(f.id),
                 SUM(CASE WHEN f.verdict = 'vulnerable' THEN 1 ELSE 0 END),
                 SUM(CASE WHEN f.verdict = 'safe'       THEN 1 ELSE 0 END)
             FROM analyses a
             LEFT JOIN files fi ON fi.analysis_id = a.id
             LEFT JOIN functions f ON f.file_id = fi.id",
            [],
            |row| {
                Ok(Kpis {
                    total_analyses: row.get(0)?,
                    total_files: row.get(1)?,
                    total_functions: row.get(2)?,
                    total_vulnerable: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                    total_safe: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                })
            },
        )?;

        let mut stmt = conn.prepare(
            "SELECT cwe, cwe_name, severity, COUNT(*) AS count
             FROM functions
             WHERE verdict = 'vulnerable' AND cwe IS NOT NULL
             GROUP BY cwe ORDER BY count DESC",
        )?;
        let cwe_counts = stmt
            .query_map([], |row| {
                Ok(CweCount {
                    cwe: row.get(0)?,
                    cwe_name: row.get(1)?,
                    severity: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT severity, COUNT(*) AS count
             FROM functions
             WHERE verdict = 'vulnerable' AND severity IS NOT NULL
             GROUP BY severity",
        )?;
        let severity_counts = stmt
            .query_map([], |row| {
                Ok(SeverityCount {
                    severity: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT
                 fi.file_path,
                 SUM(CASE WHEN f.verdict = 'safe'       THEN 1 ELSE 0 END) AS safe_count,
                 SUM(CASE WHEN f.verdict = 'vulnerable' THEN 1 ELSE 0 END) AS vuln_count
             FROM files fi
             JOIN functions f ON f.file_id = fi.id
             GROUP BY fi.id ORDER BY fi.id DESC LIMIT 10",
        )?;
        let file_ratios = stmt
            .query_map([], |row| {
                let path: String = row.get(0)?;
                Ok(FileRatio {
                    label: file_label(&path),
                    safe: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    vuln: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let confidence_bins = conn.query_row(
            "SELECT
                 SUM(CASE WHEN confidence < 0.5                       THEN 1 ELSE 0 END),
                 SUM(CASE WHEN confidence >= 0.5 AND confidence < 0.7 THEN 1 ELSE 0 END),
                 SUM(CASE WHEN confidence >= 0.7 AND confidence < 0.9 THEN 1 ELSE 0 END),
                 SUM(CASE WHEN confidence >= 0.9                      THEN 1 ELSE 0 END)
             FROM functions WHERE confidence IS NOT NULL",
            [],
            |row| {
                Ok(ConfidenceBins {
                    bin_0_50: row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                    bin_50_70: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    bin_70_90: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    bin_90_100: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                })
            },
        )?;

        let mut stmt = conn.prepare(
            "SELECT
                 a.id, a.project_name, a.project_path, a.timestamp,
                 COUNT(f.id) AS total_functions,
                 SUM(CASE WHEN f.verdict = 'vulnerable' THEN 1 ELSE 0 END) AS vuln_count
             FROM analyses a
             LEFT JOIN files fi ON fi.analysis_id = a.id
             LEFT JOIN functions f ON f.file_id = fi.id
             GROUP BY a.id ORDER BY a.timestamp DESC, a.id DESC LIMIT 7",
        )?;
        let recent_analyses = stmt
            .query_map([], |row| {
                Ok(AnalysisEntry {
                    id: row.get(0)?,
                    project_name: row.get(1)?,
                    project_path: row.get(2)?,
                    timestamp: row.get(3)?,
                    total_functions: row.get(4)?,
                    vuln_count: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(DashboardStats {
            kpis,
            cwe_counts,
            severity_counts,
            file_ratios,
            confidence_bins,
            recent_analyses,
        })
    }
}

fn file_label(path: &str) -> String {
    path.replace('\\', "/")
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}
