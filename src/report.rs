//! Output formatting for scan results, history, dashboards, and change
//! reports.
//!
//! Two formats throughout: pretty (colored terminal output) and JSON for
//! programmatic consumption.

use colored::*;
use serde::Serialize;

use crate::classify::Classification;
use crate::extract::Extraction;
use crate::monitor::ChangeReport;
use crate::scan::{FunctionResult, ScanSummary};
use crate::store::{AnalysisEntry, DashboardStats, StoredReport, WatchedProject};

/// Flat JSON shape for one classified function.
#[derive(Serialize)]
pub struct JsonFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub name: String,
    pub code: String,
    pub start_line: usize,
    pub end_line: usize,
    pub verdict: String,
    pub cwe: Option<String>,
    pub cwe_name: Option<String>,
    pub severity: Option<String>,
    pub confidence: Option<f64>,
    pub family: Option<String>,
}

/// JSON report for a completed scan.
#[derive(Serialize)]
pub struct JsonScanReport {
    pub analysis_id: i64,
    pub project_name: String,
    pub path: String,
    pub files_scanned: usize,
    pub total_functions: usize,
    pub vuln_count: usize,
    pub functions: Vec<JsonFunction>,
}

fn function_to_json(result: &FunctionResult) -> JsonFunction {
    let (verdict, cwe, cwe_name, severity, confidence, family) = match &result.classification {
        Classification::Safe => ("safe", None, None, None, None, None),
        Classification::Vulnerable {
            family,
            cwe,
            cwe_name,
            severity,
            confidence,
        } => (
            "vulnerable",
            Some(cwe.clone()),
            Some(cwe_name.clone()),
            Some(severity.as_str().to_string()),
            Some(*confidence),
            Some(family.clone()),
        ),
    };

    JsonFunction {
        file_path: result.file_path.clone(),
        name: result.record.name.clone(),
        code: result.record.code.clone(),
        start_line: result.record.start_line,
        end_line: result.record.end_line,
        verdict: verdict.to_string(),
        cwe,
        cwe_name,
        severity,
        confidence,
        family,
    }
}

/// Write a scan summary as pretty-printed JSON.
pub fn write_scan_json(summary: &ScanSummary) -> anyhow::Result<()> {
    let report = JsonScanReport {
        analysis_id: summary.analysis_id,
        project_name: summary.project_name.clone(),
        path: summary.path.clone(),
        files_scanned: summary.files_scanned,
        total_functions: summary.total_functions,
        vuln_count: summary.vuln_count,
        functions: summary.functions.iter().map(function_to_json).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Write a scan summary for human readers.
pub fn write_scan_pretty(summary: &ScanSummary) {
    println!();
    println!(
        "{} {} ({})",
        format!("Analysis #{}", summary.analysis_id).bold(),
        summary.project_name,
        summary.path.dimmed()
    );
    println!(
        "  {} file(s), {} function(s), {}",
        summary.files_scanned,
        summary.total_functions,
        if summary.vuln_count == 0 {
            "no vulnerabilities".green().to_string()
        } else {
            format!("{} vulnerable", summary.vuln_count)
                .red()
                .to_string()
        }
    );
    println!();

    for result in &summary.functions {
        let span = format!("[{}-{}]", result.record.start_line, result.record.end_line);
        match &result.classification {
            Classification::Safe => {
                println!(
                    "  {:<10} {:<30} {}",
                    span,
                    result.record.name,
                    "safe".green()
                );
            }
            Classification::Vulnerable {
                cwe,
                cwe_name,
                severity,
                confidence,
                ..
            } => {
                println!(
                    "  {:<10} {:<30} {}  {} {} ({}, {:.0}%)",
                    span,
                    result.record.name,
                    "vulnerable".red().bold(),
                    cwe,
                    cwe_name,
                    severity_colored(severity.as_str()),
                    confidence * 100.0
                );
            }
        }
        if let Some(file) = &result.file_path {
            println!("             {}", file.dimmed());
        }
    }
}

/// JSON shape for extraction-only output.
#[derive(Serialize)]
struct JsonExtraction<'a> {
    functions: &'a [crate::extract::FunctionRecord],
    count: usize,
    degraded: bool,
}

pub fn write_extraction_json(extraction: &Extraction) -> anyhow::Result<()> {
    let report = JsonExtraction {
        functions: &extraction.records,
        count: extraction.records.len(),
        degraded: extraction.degraded,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn write_extraction_pretty(extraction: &Extraction) {
    println!("Found {} function(s):", extraction.records.len());
    println!();
    for record in &extraction.records {
        println!(
            "  [{}-{}] {}",
            record.start_line,
            record.end_line,
            record.name.bold()
        );
    }
    if extraction.degraded {
        println!();
        println!(
            "{}",
            "note: source had parse errors, extraction is best-effort".yellow()
        );
    }
}

pub fn write_history_json(entries: &[AnalysisEntry]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

pub fn write_history_pretty(entries: &[AnalysisEntry]) {
    if entries.is_empty() {
        println!("No analyses recorded yet.");
        return;
    }
    println!(
        "{:<6} {:<24} {:<20} {:>10} {:>6}",
        "ID".bold(),
        "PROJECT".bold(),
        "WHEN".bold(),
        "FUNCTIONS".bold(),
        "VULN".bold()
    );
    for entry in entries {
        let vuln = if entry.vuln_count > 0 {
            entry.vuln_count.to_string().red().to_string()
        } else {
            entry.vuln_count.to_string()
        };
        println!(
            "{:<6} {:<24} {:<20} {:>10} {:>6}",
            entry.id, entry.project_name, entry.timestamp, entry.total_functions, vuln
        );
    }
}

pub fn write_report_json(report: &StoredReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

pub fn write_report_pretty(report: &StoredReport) {
    println!();
    println!(
        "{} {} ({})",
        format!("Analysis #{}", report.id).bold(),
        report.project_name,
        report.timestamp.dimmed()
    );
    for file in &report.files {
        println!();
        println!("  {}", file.file_path.underline());
        for function in &file.functions {
            let span = format!("[{}-{}]", function.start_line, function.end_line);
            if function.verdict == "vulnerable" {
                println!(
                    "    {:<10} {:<30} {}  {} {} ({})",
                    span,
                    function.function_name,
                    "vulnerable".red().bold(),
                    function.cwe.as_deref().unwrap_or("?"),
                    function.cwe_name.as_deref().unwrap_or("Unknown"),
                    severity_colored(function.severity.as_deref().unwrap_or("Unknown")),
                );
            } else {
                println!(
                    "    {:<10} {:<30} {}",
                    span,
                    function.function_name,
                    "safe".green()
                );
            }
        }
    }
}

pub fn write_dashboard_json(stats: &DashboardStats) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

pub fn write_dashboard_pretty(stats: &DashboardStats) {
    println!();
    println!("{}", "Totals".bold());
    println!("  analyses:   {}", stats.kpis.total_analyses);
    println!("  files:      {}", stats.kpis.total_files);
    println!("  functions:  {}", stats.kpis.total_functions);
    println!(
        "  vulnerable: {}",
        stats.kpis.total_vulnerable.to_string().red()
    );
    println!("  safe:       {}", stats.kpis.total_safe.to_string().green());

    if !stats.cwe_counts.is_empty() {
        println!();
        println!("{}", "By CWE".bold());
        for row in &stats.cwe_counts {
            println!(
                "  {:<10} {:<28} {:<10} {}",
                row.cwe,
                row.cwe_name.as_deref().unwrap_or("Unknown"),
                severity_colored(row.severity.as_deref().unwrap_or("Unknown")),
                row.count
            );
        }
    }

    if !stats.recent_analyses.is_empty() {
        println!();
        println!("{}", "Recent analyses".bold());
        for entry in &stats.recent_analyses {
            println!(
                "  #{:<5} {:<24} {} function(s), {} vulnerable",
                entry.id, entry.project_name, entry.total_functions, entry.vuln_count
            );
        }
    }
}

pub fn write_change_report_json(report: &ChangeReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

pub fn write_change_report_pretty(report: &ChangeReport) {
    println!();
    println!(
        "{} {} ({})",
        format!("Project #{}", report.project_id).bold(),
        report.project_name,
        report.folder_path.dimmed()
    );

    if report.changes.is_empty() {
        println!("  {}", "no changes since last snapshot".green());
        return;
    }

    for path in &report.changes.added {
        println!("  {} {}", "added".green().bold(), path);
    }
    for path in &report.changes.changed {
        println!("  {} {}", "changed".yellow().bold(), path);
    }
    for path in &report.changes.deleted {
        println!("  {} {}", "deleted".red().bold(), path);
    }
    println!();
    println!("  {} change(s) need re-scanning", report.total_changes);
}

pub fn write_watched_json(projects: &[WatchedProject]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(projects)?);
    Ok(())
}

pub fn write_watched_pretty(projects: &[WatchedProject]) {
    if projects.is_empty() {
        println!("No watched projects.");
        return;
    }
    println!(
        "{:<6} {:<24} {:<40} {}",
        "ID".bold(),
        "NAME".bold(),
        "FOLDER".bold(),
        "REGISTERED".bold()
    );
    for project in projects {
        println!(
            "{:<6} {:<24} {:<40} {}",
            project.id, project.name, project.folder_path, project.registered_at
        );
    }
}

fn severity_colored(severity: &str) -> ColoredString {
    match severity {
        "Critical" => severity.red().bold(),
        "High" => severity.red(),
        "Medium" => severity.yellow(),
        _ => severity.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Severity;
    use crate::extract::FunctionRecord;

    fn sample_summary() -> ScanSummary {
        ScanSummary {
            analysis_id: 1,
            project_name: "demo.cpp".to_string(),
            path: "/tmp/demo.cpp".to_string(),
            files_scanned: 1,
            total_functions: 2,
            vuln_count: 1,
            functions: vec![
                FunctionResult {
                    file_path: None,
                    record: FunctionRecord {
                        name: "readBuffer".to_string(),
                        code: "void readBuffer() {}".to_string(),
                        start_line: 1,
                        end_line: 3,
                    },
                    classification: Classification::Vulnerable {
                        family: "memory_corruption".to_string(),
                        cwe: "CWE-125".to_string(),
                        cwe_name: "Out-of-bounds Read".to_string(),
                        severity: Severity::High,
                        confidence: 0.92,
                    },
                },
                FunctionResult {
                    file_path: None,
                    record: FunctionRecord {
                        name: "cleanup".to_string(),
                        code: "void cleanup() {}".to_string(),
                        start_line: 5,
                        end_line: 6,
                    },
                    classification: Classification::Safe,
                },
            ],
        }
    }

    #[test]
    fn test_json_function_flattens_classification() {
        let summary = sample_summary();
        let vulnerable = function_to_json(&summary.functions[0]);
        assert_eq!(vulnerable.verdict, "vulnerable");
        assert_eq!(vulnerable.cwe.as_deref(), Some("CWE-125"));
        assert_eq!(vulnerable.severity.as_deref(), Some("High"));
        assert_eq!(vulnerable.family.as_deref(), Some("memory_corruption"));

        let safe = function_to_json(&summary.functions[1]);
        assert_eq!(safe.verdict, "safe");
        assert!(safe.cwe.is_none());
        assert!(safe.confidence.is_none());
        assert!(safe.family.is_none());
    }

    #[test]
    fn test_scan_report_serializes() {
        let summary = sample_summary();
        let report = JsonScanReport {
            analysis_id: summary.analysis_id,
            project_name: summary.project_name.clone(),
            path: summary.path.clone(),
            files_scanned: summary.files_scanned,
            total_functions: summary.total_functions,
            vuln_count: summary.vuln_count,
            functions: summary.functions.iter().map(function_to_json).collect(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["vuln_count"], 1);
        assert_eq!(json["functions"][0]["name"], "readBuffer");
        // Safe rows keep their null verdict fields, matching the stored shape.
        assert!(json["functions"][1]["cwe"].is_null());
    }
}
