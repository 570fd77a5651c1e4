//! Scan orchestration: extract functions, classify each, persist, summarize.
//!
//! The pipeline is synchronous and strictly sequential: each file is parsed,
//! then each of its functions is classified and persisted in order, before
//! the next file is touched. A classifier error aborts the in-flight scan
//! immediately; rows persisted before the failure are deliberately left in
//! place (the persistence discipline holds no spanning transaction), but the
//! returned result is the error, never a partial summary.

use std::path::Path;

use crate::classify::{Classification, Classifier};
use crate::error::{Result, ScanError};
use crate::extract::{self, FunctionRecord};
use crate::monitor::walk;
use crate::store::Store;

/// One classified function in a scan summary.
#[derive(Debug, Clone)]
pub struct FunctionResult {
    /// Owning file, set in folder scans.
    pub file_path: Option<String>,
    pub record: FunctionRecord,
    pub classification: Classification,
}

/// Outcome of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub analysis_id: i64,
    pub project_name: String,
    pub path: String,
    pub files_scanned: usize,
    pub total_functions: usize,
    pub vuln_count: usize,
    pub functions: Vec<FunctionResult>,
}

/// Drives scans against an injected store and classifier.
pub struct Scanner<'a> {
    store: &'a Store,
    classifier: &'a dyn Classifier,
}

impl<'a> Scanner<'a> {
    pub fn new(store: &'a Store, classifier: &'a dyn Classifier) -> Self {
        Self { store, classifier }
    }

    /// Analyze a single source file.
    pub fn scan_file(&self, path: &Path) -> Result<ScanSummary> {
        if !path.exists() {
            return Err(ScanError::NotFound(path.to_path_buf()));
        }
        self.ensure_classifier()?;

        let extraction = extract::extract_file(path);
        if extraction.degraded {
            tracing::warn!(path = %path.display(), "parse degraded, extraction is best-effort");
        }
        if extraction.records.is_empty() {
            return Err(ScanError::NoFunctionsFound(path.to_path_buf()));
        }

        let project_name = display_name(path);
        let path_str = path.to_string_lossy().into_owned();
        let analysis_id = self.store.save_analysis(&project_name, &path_str)?;
        let file_id = self.store.save_file(analysis_id, &path_str)?;

        let mut functions = Vec::with_capacity(extraction.records.len());
        let mut vuln_count = 0;
        for record in extraction.records {
            let classification = self.classify_and_persist(file_id, &record, None)?;
            if classification.is_vulnerable() {
                vuln_count += 1;
            }
            functions.push(FunctionResult {
                file_path: None,
                record,
                classification,
            });
        }

        Ok(ScanSummary {
            analysis_id,
            project_name,
            path: path_str,
            files_scanned: 1,
            total_functions: functions.len(),
            vuln_count,
            functions,
        })
    }

    /// Analyze every eligible source file under a folder.
    pub fn scan_folder(&self, folder: &Path) -> Result<ScanSummary> {
        if !folder.exists() {
            return Err(ScanError::NotFound(folder.to_path_buf()));
        }
        self.ensure_classifier()?;

        let files = walk::collect_source_files(folder);
        if files.is_empty() {
            return Err(ScanError::NoSourceFiles(folder.to_path_buf()));
        }

        let project_name = display_name(folder);
        let folder_str = folder.to_string_lossy().into_owned();
        let analysis_id = self.store.save_analysis(&project_name, &folder_str)?;

        let files_scanned = files.len();
        let mut functions = Vec::new();
        let mut vuln_count = 0;

        for file in files {
            let file_str = file.to_string_lossy().into_owned();
            let file_id = self.store.save_file(analysis_id, &file_str)?;

            // Unreadable files extract to nothing and are skipped, never
            // aborting the folder scan.
            let extraction = extract::extract_file(&file);
            if extraction.degraded {
                tracing::warn!(path = %file.display(), "parse degraded, extraction is best-effort");
            }

            for record in extraction.records {
                let classification =
                    self.classify_and_persist(file_id, &record, Some(&file_str))?;
                if classification.is_vulnerable() {
                    vuln_count += 1;
                }
                functions.push(FunctionResult {
                    file_path: Some(file_str.clone()),
                    record,
                    classification,
                });
            }
        }

        Ok(ScanSummary {
            analysis_id,
            project_name,
            path: folder_str,
            files_scanned,
            total_functions: functions.len(),
            vuln_count,
            functions,
        })
    }

    fn classify_and_persist(
        &self,
        file_id: i64,
        record: &FunctionRecord,
        file_path: Option<&str>,
    ) -> Result<Classification> {
        tracing::debug!(function = %record.name, file = file_path.unwrap_or("-"), "classifying");
        let classification = self.classifier.analyze(&record.code)?;
        self.store.save_function(file_id, record, &classification)?;
        Ok(classification)
    }

    fn ensure_classifier(&self) -> Result<()> {
        if self.classifier.health() {
            Ok(())
        } else {
            Err(ScanError::ClassifierUnavailable)
        }
    }
}

/// Base name of a file or folder, trailing separators ignored.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
