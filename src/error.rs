//! Error taxonomy for the analysis and monitoring pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::classify::ClassifierError;

/// Errors surfaced by scans, monitoring, and persistence.
///
/// Every variant carries enough context to render an actionable message:
/// "not found" is distinct from "unreachable" is distinct from "empty input".
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no functions found in {} (is it a valid C/C++ source file?)", .0.display())]
    NoFunctionsFound(PathBuf),

    #[error("no C/C++ source files found under {}", .0.display())]
    NoSourceFiles(PathBuf),

    #[error("watched project {0} not found")]
    ProjectNotFound(i64),

    #[error("no analysis found with id {0}")]
    AnalysisNotFound(i64),

    #[error("folder is already being watched: {}", .0.display())]
    DuplicateFolder(PathBuf),

    #[error("classifier is unreachable; is the inference service running?")]
    ClassifierUnavailable,

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
