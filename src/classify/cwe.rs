//! Fixed lookup table for the CWE classes the classifier can emit.

use serde::{Deserialize, Serialize};

/// Severity tier attached to a CWE class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Critical" => Ok(Severity::Critical),
            "High" => Ok(Severity::High),
            "Medium" => Ok(Severity::Medium),
            "Unknown" => Ok(Severity::Unknown),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

struct CweInfo {
    id: &'static str,
    name: &'static str,
    severity: Severity,
}

static CWE_TABLE: &[CweInfo] = &[
    CweInfo {
        id: "CWE-125",
        name: "Out-of-bounds Read",
        severity: Severity::High,
    },
    CweInfo {
        id: "CWE-787",
        name: "Out-of-bounds Write",
        severity: Severity::Critical,
    },
    CweInfo {
        id: "CWE-190",
        name: "Integer Overflow",
        severity: Severity::Medium,
    },
    CweInfo {
        id: "CWE-369",
        name: "Divide By Zero",
        severity: Severity::Medium,
    },
    CweInfo {
        id: "CWE-415",
        name: "Double Free",
        severity: Severity::High,
    },
    CweInfo {
        id: "CWE-476",
        name: "NULL Pointer Dereference",
        severity: Severity::High,
    },
];

/// Resolve a CWE identifier to its human-readable name and severity tier.
/// Unrecognized identifiers resolve to Unknown rather than failing.
pub fn lookup(cwe: &str) -> (&'static str, Severity) {
    CWE_TABLE
        .iter()
        .find(|info| info.id == cwe)
        .map(|info| (info.name, info.severity))
        .unwrap_or(("Unknown", Severity::Unknown))
}
