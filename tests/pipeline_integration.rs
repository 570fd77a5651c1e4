//! End-to-end pipeline tests with a fake classifier and a temporary store.
//!
//! These exercise the orchestration contracts: health gating, typed errors
//! on empty input, the fail-fast-but-keep-persisted policy, folder
//! aggregation, and the register/check monitor scenario.

use std::path::Path;

use tempfile::TempDir;

use ccure::classify::{Classification, Classifier, ClassifierError, Severity};
use ccure::monitor::Monitor;
use ccure::scan::Scanner;
use ccure::store::Store;
use ccure::ScanError;

/// Classifier fake: any function whose code contains a marker is reported
/// vulnerable; a `fail_on` marker simulates a mid-scan service failure.
struct FakeClassifier {
    healthy: bool,
    vulnerable_marker: Option<&'static str>,
    fail_on: Option<&'static str>,
}

impl FakeClassifier {
    fn healthy() -> Self {
        Self {
            healthy: true,
            vulnerable_marker: None,
            fail_on: None,
        }
    }

    fn flagging(marker: &'static str) -> Self {
        Self {
            healthy: true,
            vulnerable_marker: Some(marker),
            fail_on: None,
        }
    }

    fn failing_on(marker: &'static str) -> Self {
        Self {
            healthy: true,
            vulnerable_marker: None,
            fail_on: Some(marker),
        }
    }

    fn down() -> Self {
        Self {
            healthy: false,
            vulnerable_marker: None,
            fail_on: None,
        }
    }
}

impl Classifier for FakeClassifier {
    fn health(&self) -> bool {
        self.healthy
    }

    fn analyze(&self, code: &str) -> Result<Classification, ClassifierError> {
        if let Some(marker) = self.fail_on {
            if code.contains(marker) {
                return Err(ClassifierError::Timeout);
            }
        }
        if let Some(marker) = self.vulnerable_marker {
            if code.contains(marker) {
                return Ok(Classification::Vulnerable {
                    family: "memory_corruption".to_string(),
                    cwe: "CWE-125".to_string(),
                    cwe_name: "Out-of-bounds Read".to_string(),
                    severity: Severity::High,
                    confidence: 0.9,
                });
            }
        }
        Ok(Classification::Safe)
    }
}

fn test_store(temp: &TempDir) -> Store {
    Store::open(temp.path().join("ccure.db")).unwrap()
}

fn write_file(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn test_scan_file_persists_and_summarizes() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let classifier = FakeClassifier::flagging("memcpy");
    let scanner = Scanner::new(&store, &classifier);

    let file = temp.path().join("demo.cpp");
    std::fs::write(
        &file,
        "void copy(char* dst, char* src, int n) {\n memcpy(dst, src, n);\n}\n\nvoid noop() {\n}\n",
    )
    .unwrap();

    let summary = scanner.scan_file(&file).unwrap();
    assert_eq!(summary.project_name, "demo.cpp");
    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.total_functions, 2);
    assert_eq!(summary.vuln_count, 1);
    assert!(summary.functions[0].classification.is_vulnerable());
    assert!(!summary.functions[1].classification.is_vulnerable());

    // Everything reached the store.
    let report = store.get_report(summary.analysis_id).unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].functions.len(), 2);
    assert_eq!(report.files[0].functions[0].verdict, "vulnerable");
    assert_eq!(
        report.files[0].functions[0].cwe.as_deref(),
        Some("CWE-125")
    );
}

#[test]
fn test_scan_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let classifier = FakeClassifier::healthy();
    let scanner = Scanner::new(&store, &classifier);

    let err = scanner
        .scan_file(&temp.path().join("missing.cpp"))
        .unwrap_err();
    assert!(matches!(err, ScanError::NotFound(_)));
}

#[test]
fn test_scan_aborts_up_front_when_classifier_is_down() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let classifier = FakeClassifier::down();
    let scanner = Scanner::new(&store, &classifier);

    let file = temp.path().join("demo.cpp");
    std::fs::write(&file, "void f() {}\n").unwrap();

    let err = scanner.scan_file(&file).unwrap_err();
    assert!(matches!(err, ScanError::ClassifierUnavailable));

    // Health is probed before any write: no partial analysis appears.
    assert!(store.get_all_analyses().unwrap().is_empty());
}

#[test]
fn test_scan_file_with_no_functions() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let classifier = FakeClassifier::healthy();
    let scanner = Scanner::new(&store, &classifier);

    let file = temp.path().join("empty.cpp");
    std::fs::write(&file, "// only comments here\n").unwrap();

    let err = scanner.scan_file(&file).unwrap_err();
    assert!(matches!(err, ScanError::NoFunctionsFound(_)));
    assert!(store.get_all_analyses().unwrap().is_empty());
}

#[test]
fn test_classifier_failure_aborts_but_keeps_earlier_rows() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let classifier = FakeClassifier::failing_on("second");
    let scanner = Scanner::new(&store, &classifier);

    let file = temp.path().join("demo.cpp");
    std::fs::write(
        &file,
        "void first() {}\nvoid second() {}\nvoid third() {}\n",
    )
    .unwrap();

    let err = scanner.scan_file(&file).unwrap_err();
    assert!(matches!(
        err,
        ScanError::Classifier(ClassifierError::Timeout)
    ));

    // Fail-fast is not transactional: the row classified before the failure
    // stays persisted even though the scan reported an error.
    let history = store.get_all_analyses().unwrap();
    assert_eq!(history.len(), 1);
    let report = store.get_report(history[0].id).unwrap();
    let functions = &report.files[0].functions;
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].function_name, "first");
}

#[test]
fn test_scan_folder_aggregates_across_files() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let classifier = FakeClassifier::flagging("strcpy");
    let scanner = Scanner::new(&store, &classifier);

    let project = temp.path().join("proj");
    write_file(
        &project,
        "src/a.cpp",
        "void unsafeCopy(char* d, char* s) {\n strcpy(d, s);\n}\n",
    );
    write_file(&project, "src/b.cpp", "void fine() {}\nint also_fine() { return 1; }\n");
    // Denylisted and hidden directories never contribute functions.
    write_file(&project, "build/gen.cpp", "void generated() {}\n");
    write_file(&project, ".cache/tmp.cpp", "void cached() {}\n");

    let summary = scanner.scan_folder(&project).unwrap();
    assert_eq!(summary.project_name, "proj");
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.total_functions, 3);
    assert_eq!(summary.vuln_count, 1);

    // Folder-mode results are tagged with their owning file.
    for function in &summary.functions {
        assert!(function.file_path.is_some());
    }
    let vulnerable = summary
        .functions
        .iter()
        .find(|f| f.classification.is_vulnerable())
        .unwrap();
    assert!(vulnerable.file_path.as_deref().unwrap().ends_with("a.cpp"));
}

#[test]
fn test_scan_folder_without_sources() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let classifier = FakeClassifier::healthy();
    let scanner = Scanner::new(&store, &classifier);

    let project = temp.path().join("proj");
    write_file(&project, "README.md", "no sources");

    let err = scanner.scan_folder(&project).unwrap_err();
    assert!(matches!(err, ScanError::NoSourceFiles(_)));
}

#[test]
fn test_register_then_immediate_check_sees_no_changes() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let monitor = Monitor::new(&store);

    let project = temp.path().join("proj");
    write_file(&project, "a.cpp", "void a() {}");
    write_file(&project, "b.cpp", "void b() {}");
    write_file(&project, "c.cpp", "void c() {}");

    let registered = monitor.register(&project).unwrap();
    assert_eq!(registered.files_tracked, 3);

    let report = monitor.check(registered.id).unwrap();
    assert!(report.changes.added.is_empty());
    assert!(report.changes.changed.is_empty());
    assert!(report.changes.deleted.is_empty());
    assert_eq!(report.total_changes, 0);
}

#[test]
fn test_modifying_one_file_yields_one_change() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let monitor = Monitor::new(&store);

    let project = temp.path().join("proj");
    write_file(&project, "a.cpp", "void a() {}");
    write_file(&project, "b.cpp", "void b() {}");

    let registered = monitor.register(&project).unwrap();
    write_file(&project, "b.cpp", "void b() { touched(); }");

    let report = monitor.check(registered.id).unwrap();
    assert_eq!(report.changes.changed.len(), 1);
    assert!(report.changes.changed[0].ends_with("b.cpp"));
    assert_eq!(report.total_changes, 1);
}

#[test]
fn test_monitor_feeds_targeted_rescan() {
    let temp = TempDir::new().unwrap();
    let store = test_store(&temp);
    let monitor = Monitor::new(&store);
    let classifier = FakeClassifier::healthy();
    let scanner = Scanner::new(&store, &classifier);

    let project = temp.path().join("proj");
    write_file(&project, "a.cpp", "void a() {}");
    write_file(&project, "b.cpp", "void b() {}");

    let registered = monitor.register(&project).unwrap();
    write_file(&project, "a.cpp", "void a() { changed(); }");

    // The changed-file list from check drives a per-file re-scan.
    let report = monitor.check(registered.id).unwrap();
    assert_eq!(report.changes.changed.len(), 1);
    for changed in &report.changes.changed {
        let summary = scanner.scan_file(Path::new(changed)).unwrap();
        assert_eq!(summary.total_functions, 1);
    }

    monitor.refresh(registered.id).unwrap();
    assert_eq!(monitor.check(registered.id).unwrap().total_changes, 0);
}
