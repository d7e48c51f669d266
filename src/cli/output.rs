//! Output formatting for CLI

use crate::daemon::CycleReport;
use crate::models::{BackupOutcome, BatchOutcome, Snapshot};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::fmt::Write;

/// Show at most this many errors before summarising the rest.
const MAX_LISTED_ERRORS: usize = 5;

/// Format any report as pretty JSON
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Format a snapshot as a table of files
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} ({} files)",
        snapshot.directory.display(),
        snapshot.len()
    );
    if snapshot.is_empty() {
        let _ = writeln!(out, "No files found.");
    } else {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<40} {:<14} {:<12} {:>10}  {}",
            "File", "Department", "Owner", "Size", "Modified"
        );
        let _ = writeln!(out, "{}", "-".repeat(98));
        for file in &snapshot.files {
            let _ = writeln!(
                out,
                "{:<40} {:<14} {:<12} {:>10}  {}",
                file.filename,
                file.department.as_deref().unwrap_or("-"),
                file.owner,
                file.size,
                format_mtime(file.modified)
            );
        }
    }

    if !snapshot.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Errors encountered: {}", snapshot.errors.len());
        for error in snapshot.errors.iter().take(MAX_LISTED_ERRORS) {
            let _ = writeln!(out, "  {}: {}", error.path, error.message);
        }
        if snapshot.errors.len() > MAX_LISTED_ERRORS {
            let _ = writeln!(
                out,
                "  ... and {} more",
                snapshot.errors.len() - MAX_LISTED_ERRORS
            );
        }
    }

    out
}

pub fn format_cycle(report: &CycleReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Cycle: {}", report.status());
    match (&report.transfer, &report.transfer_error) {
        (Some(transfer), _) => {
            let _ = writeln!(out, "Transfer: {}", format_batch(transfer));
        }
        (None, Some(err)) => {
            let _ = writeln!(out, "Transfer: failed ({err})");
        }
        (None, None) => {}
    }
    match report.missing {
        Some(0) => {
            let _ = writeln!(out, "Missing reports: none");
        }
        Some(count) => {
            let _ = writeln!(out, "Missing reports: {count}");
        }
        None => {
            let _ = writeln!(out, "Missing reports: not checked");
        }
    }
    match (&report.backup, &report.backup_error) {
        (Some(backup), _) => out.push_str(&format_backup(backup)),
        (None, Some(err)) => {
            let _ = writeln!(out, "Backup: failed ({err})");
        }
        (None, None) => {}
    }
    for failure in report.lock_failures.iter().chain(&report.unlock_failures) {
        let _ = writeln!(out, "  {failure}");
    }

    out
}

pub fn format_backup(outcome: &BackupOutcome) -> String {
    format!(
        "Backup: {} -> {}\n",
        format_batch(&outcome.batch),
        outcome.directory.display()
    )
}

pub fn format_missing(missing: &[String]) -> String {
    if missing.is_empty() {
        return "All departments have submitted reports.\n".to_string();
    }

    let mut out = format!("Missing reports from {} departments:\n", missing.len());
    for department in missing {
        let _ = writeln!(out, "  {department}");
    }
    out
}

fn format_batch(batch: &BatchOutcome) -> String {
    let mut line = format!(
        "{} ({}/{} files)",
        batch.status(),
        batch.succeeded,
        batch.attempted
    );
    for failure in &batch.failures {
        let _ = write!(line, "\n  {}: {}", failure.name, failure.reason);
    }
    line
}

fn format_mtime(secs: i64) -> String {
    Local.timestamp_opt(secs, 0).single().map_or_else(
        || secs.to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
