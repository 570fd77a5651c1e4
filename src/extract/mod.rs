//! Function extraction from C/C++ source.
//!
//! Carves a source file into discrete function records using a tree-sitter
//! parse. Extraction is infallible by design: malformed input degrades to a
//! best-effort partial tree, an unreadable file reads as zero functions, and
//! a file with no functions yields an empty result rather than an error.

mod tree;
mod visitor;

use std::path::Path;

use serde::Serialize;

pub use tree::ParsedSource;

/// A single function definition carved out of a source file.
///
/// `code` is the verbatim source slice of the whole definition, including the
/// signature and, for templates, the template parameter header. Lines are
/// 1-indexed and `start_line <= end_line` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    pub code: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Result of extracting one source file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Function records in source (top-to-bottom) order.
    pub records: Vec<FunctionRecord>,
    /// True when the grammar recovered from parse errors; extraction still
    /// proceeded over the partial tree.
    pub degraded: bool,
}

impl Extraction {
    fn empty() -> Self {
        Self::default()
    }
}

/// Extract all top-level function definitions from raw source bytes.
pub fn extract_source(source: &[u8]) -> Extraction {
    match tree::parse(source) {
        Some(parsed) => Extraction {
            degraded: parsed.has_errors(),
            records: visitor::collect_functions(&parsed),
        },
        None => {
            tracing::debug!("parser produced no tree, returning empty extraction");
            Extraction {
                records: Vec::new(),
                degraded: true,
            }
        }
    }
}

/// Extract functions from a file on disk.
///
/// A missing or unreadable file yields an empty extraction; the caller
/// distinguishes "no file" from "no functions" with its own existence check.
pub fn extract_file(path: &Path) -> Extraction {
    match std::fs::read(path) {
        Ok(bytes) => extract_source(&bytes),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "unreadable source file");
            Extraction::empty()
        }
    }
}
