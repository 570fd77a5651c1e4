//! ccure - C/C++ vulnerability analysis pipeline.
//!
//! ccure ingests C/C++ source trees, carves each file into discrete function
//! records with tree-sitter, hands every function to an external classifier,
//! and persists the verdicts into SQLite with aggregate reporting. Watched
//! folders keep a content-hash snapshot so re-scans only need to touch files
//! whose bytes actually changed.
//!
//! # Architecture
//!
//! - `extract`: tree-sitter traversal that emits ordered function records,
//!   handling C++ declarator nesting (pointers, references, templates,
//!   qualified names)
//! - `monitor`: content hashing, folder scan policy, snapshot diffing, and
//!   the watched-project lifecycle
//! - `classify`: the external classifier boundary (triage + classify over
//!   HTTP) and the local CWE lookup table
//! - `store`: SQLite persistence for analyses, files, functions, watched
//!   projects, and file hashes
//! - `scan`: the orchestrator wiring extraction, classification, and
//!   persistence into file and folder scans
//! - `report`: pretty and JSON output formatting

pub mod classify;
pub mod cli;
pub mod error;
pub mod extract;
pub mod monitor;
pub mod report;
pub mod scan;
pub mod store;

pub use classify::{Classification, Classifier, ClassifierError, HttpClassifier, Severity, Verdict};
pub use error::{Result, ScanError};
pub use extract::{extract_file, extract_source, Extraction, FunctionRecord};
pub use monitor::{ChangeReport, ChangeSet, Monitor};
pub use scan::{FunctionResult, Scanner, ScanSummary};
pub use store::Store;
