//! Missing-submission checker.

use crate::io::journal::Journal;
use crate::models::Snapshot;

/// Expected departments with no matching report in `snapshot`, in `expected`
/// order. Department names compare case-insensitively.
#[must_use]
pub fn missing_departments(snapshot: &Snapshot, expected: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|wanted| {
            !snapshot.files.iter().any(|file| {
                file.department
                    .as_deref()
                    .is_some_and(|dept| dept.eq_ignore_ascii_case(wanted))
            })
        })
        .cloned()
        .collect()
}

/// Log one error line per missing department and return how many are missing.
pub fn check_missing(snapshot: &Snapshot, expected: &[String], journal: &dyn Journal) -> usize {
    journal.operation("Checking for missing department reports");

    let missing = missing_departments(snapshot, expected);
    for department in &missing {
        journal.error(&format!("Missing report from department: {department}"));
    }

    journal.operation(&format!(
        "Missing report check completed, {} missing",
        missing.len()
    ));
    missing.len()
}
