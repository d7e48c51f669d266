//! Unit tests for CLI output formatting

use crate::fixtures::{record, snapshot};
use reportd::cli::output::{format_cycle, format_json, format_missing, format_snapshot};
use reportd::daemon::CycleReport;
use reportd::BatchOutcome;

#[test]
fn missing_output_lists_departments() {
    assert_eq!(
        format_missing(&[]),
        "All departments have submitted reports.\n"
    );
    assert_eq!(
        format_missing(&["Manufacturing".to_string(), "Distribution".to_string()]),
        "Missing reports from 2 departments:\n  Manufacturing\n  Distribution\n"
    );
}

#[test]
fn snapshot_table_names_every_file() {
    let snap = snapshot(vec![
        record("a.xml", 0, "alice"),
        record("b.xml", 0, "bob"),
    ]);
    let text = format_snapshot(&snap);

    assert!(text.starts_with("/inbox (2 files)"));
    assert!(text.contains("a.xml"));
    assert!(text.contains("bob"));
    assert!(!text.contains("Errors encountered"));
}

#[test]
fn snapshot_json_shape() {
    let snap = snapshot(vec![record("a.xml", 42, "alice")]);
    let value: serde_json::Value = serde_json::from_str(&format_json(&snap)).unwrap();

    assert_eq!(value["directory"], "/inbox");
    assert_eq!(value["files"][0]["filename"], "a.xml");
    assert_eq!(value["files"][0]["modified"], 42);
    assert!(value["files"][0]["department"].is_null());
    assert_eq!(value["errors"].as_array().map(Vec::len), Some(0));
}

#[test]
fn cycle_summary_reports_status_and_failures() {
    let mut transfer = BatchOutcome::default();
    transfer.record_success();
    transfer.record_failure("b.xml", "permission denied");

    let report = CycleReport {
        transfer: Some(transfer),
        missing: Some(1),
        backup_error: Some("dashboard unreadable".to_string()),
        ..CycleReport::default()
    };
    let text = format_cycle(&report);

    assert!(text.starts_with("Cycle: partial\n"));
    assert!(text.contains("Transfer: partial (1/2 files)"));
    assert!(text.contains("b.xml: permission denied"));
    assert!(text.contains("Missing reports: 1"));
    assert!(text.contains("Backup: failed (dashboard unreadable)"));

    let value: serde_json::Value = serde_json::from_str(&format_json(&report)).unwrap();
    assert_eq!(value["missing"], 1);
    assert_eq!(value["transfer"]["succeeded"], 1);
}
