//! Unit tests for the missing-submission checker

use crate::fixtures::{record, snapshot};
use reportd::io::journal::MemoryJournal;
use reportd::services::missing::{check_missing, missing_departments};

fn departments() -> Vec<String> {
    ["Warehouse", "Manufacturing", "Sales", "Distribution"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn report(name: &str) -> reportd::FileRecord {
    let mut file = record(name, 0, "someone");
    file.department =
        reportd::services::naming::department_from_filename(name).map(str::to_string);
    file
}

#[test]
fn lists_departments_without_a_report_in_expected_order() {
    let dashboard = snapshot(vec![
        report("report_Warehouse_2025-03-08.xml"),
        report("report_Sales_2025-03-08.xml"),
    ]);

    assert_eq!(
        missing_departments(&dashboard, &departments()),
        vec!["Manufacturing".to_string(), "Distribution".to_string()]
    );
}

#[test]
fn department_match_ignores_case() {
    let dashboard = snapshot(vec![
        report("report_warehouse_2025-03-08.xml"),
        report("report_MANUFACTURING_2025-03-08.xml"),
        report("report_Sales_2025-03-08.xml"),
        report("report_distribution.xml"),
    ]);

    assert!(missing_departments(&dashboard, &departments()).is_empty());
}

#[test]
fn empty_dashboard_misses_everyone() {
    let dashboard = snapshot(vec![]);
    assert_eq!(missing_departments(&dashboard, &departments()), departments());
}

#[test]
fn non_report_files_do_not_count() {
    let dashboard = snapshot(vec![record("Warehouse.txt", 0, "x")]);
    assert_eq!(missing_departments(&dashboard, &departments()).len(), 4);
}

#[test]
fn check_logs_one_error_per_missing_department() {
    let journal = MemoryJournal::new();
    let dashboard = snapshot(vec![
        report("report_Warehouse_2025-03-08.xml"),
        report("report_Sales_2025-03-08.xml"),
    ]);

    let count = check_missing(&dashboard, &departments(), &journal);

    assert_eq!(count, 2);
    assert_eq!(
        journal.errors(),
        vec![
            "Missing report from department: Manufacturing".to_string(),
            "Missing report from department: Distribution".to_string(),
        ]
    );
    assert!(
        journal
            .operations()
            .contains(&"Missing report check completed, 2 missing".to_string())
    );
}
