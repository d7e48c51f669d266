//! Integration tests for copy, move and the report transfer batch

use crate::fixtures::{entry_names, raw_entry_names, running_as_root, write_file};
use reportd::io::journal::{FileJournal, MemoryJournal};
use reportd::models::{ChangeAction, OutcomeStatus};
use reportd::services::scan::owner::owner_name;
use reportd::services::transfer::{copy_file, copy_then_remove, move_file, transfer_reports};
use reportd::{Error, Layout};
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use tempfile::TempDir;

#[test]
fn copy_preserves_content_larger_than_one_chunk() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("big.xml");
    let destination = temp_dir.path().join("copy.xml");
    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    write_file(&source, &content);

    let copied = copy_file(&source, &destination).unwrap();

    assert_eq!(copied, 10_000);
    assert_eq!(fs::read(&destination).unwrap(), content);
    assert!(source.exists());
}

#[test]
fn copy_truncates_existing_destination() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("short.xml");
    let destination = temp_dir.path().join("long.xml");
    write_file(&source, b"new");
    write_file(&destination, b"much longer old content");

    copy_file(&source, &destination).unwrap();
    assert_eq!(fs::read(&destination).unwrap(), b"new");
}

#[test]
fn copy_from_missing_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = copy_file(
        &temp_dir.path().join("absent.xml"),
        &temp_dir.path().join("out.xml"),
    );
    assert!(matches!(result, Err(Error::CopyFailed { .. })));
}

#[test]
fn move_renames_within_filesystem() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("a.xml");
    let destination = temp_dir.path().join("b.xml");
    write_file(&source, b"payload");

    move_file(&source, &destination).unwrap();

    assert!(!source.exists());
    assert_eq!(fs::read(&destination).unwrap(), b"payload");
}

#[test]
fn copy_then_remove_deletes_source() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("a.xml");
    let destination = temp_dir.path().join("b.xml");
    write_file(&source, b"payload");

    copy_then_remove(&source, &destination).unwrap();

    assert!(!source.exists());
    assert_eq!(fs::read(&destination).unwrap(), b"payload");
}

#[test]
fn copy_then_remove_surfaces_undeletable_source() {
    if running_as_root() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let inbox = temp_dir.path().join("upload");
    fs::create_dir(&inbox).unwrap();
    let source = inbox.join("a.xml");
    let destination = temp_dir.path().join("a.xml");
    write_file(&source, b"payload");
    fs::set_permissions(&inbox, fs::Permissions::from_mode(0o555)).unwrap();

    let result = copy_then_remove(&source, &destination);
    fs::set_permissions(&inbox, fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(Error::TransferFailed { path, reason }) => {
            assert_eq!(path, source);
            assert!(reason.contains("failed to delete source"), "{reason}");
        }
        other => panic!("expected TransferFailed, got {other:?}"),
    }
    // The duplicate is left in place for the operator.
    assert_eq!(fs::read(&source).unwrap(), b"payload");
    assert_eq!(fs::read(&destination).unwrap(), b"payload");
}

#[test]
fn move_into_missing_directory_fails_and_keeps_source() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("a.xml");
    write_file(&source, b"payload");

    let result = move_file(&source, &temp_dir.path().join("absent/a.xml"));

    assert!(matches!(result, Err(Error::TransferFailed { .. })));
    assert!(source.exists());
}

fn layout_in(temp_dir: &TempDir) -> Layout {
    let layout = Layout::new(temp_dir.path());
    layout.ensure().unwrap();
    layout
}

#[test]
fn transfer_moves_only_report_files() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    write_file(layout.inbox.join("report_Sales_2025-03-08.xml"), b"<sales/>");
    write_file(layout.inbox.join("report_Warehouse_2025-03-08.xml"), b"<wh/>");
    write_file(layout.inbox.join("draft.txt"), b"draft");
    write_file(layout.inbox.join(".hidden.xml"), b"hidden");

    let journal = MemoryJournal::new();
    let outcome = transfer_reports(&layout.inbox, &layout.dashboard, &journal).unwrap();

    assert_eq!(outcome.status(), OutcomeStatus::Success);
    assert_eq!((outcome.succeeded, outcome.attempted), (2, 2));
    assert_eq!(
        entry_names(&layout.dashboard),
        vec!["report_Sales_2025-03-08.xml", "report_Warehouse_2025-03-08.xml"]
    );
    assert_eq!(entry_names(&layout.inbox), vec![".hidden.xml", "draft.txt"]);
    assert_eq!(
        fs::read(layout.dashboard.join("report_Sales_2025-03-08.xml")).unwrap(),
        b"<sales/>"
    );

    let changes = journal.changes();
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|(_, _, action)| *action == ChangeAction::Transferred));
    assert!(
        journal
            .operations()
            .contains(&"Starting report transfer from upload to dashboard".to_string())
    );
}

#[test]
fn transfer_of_empty_inbox_is_success() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);

    let journal = MemoryJournal::new();
    let outcome = transfer_reports(&layout.inbox, &layout.dashboard, &journal).unwrap();

    assert_eq!(outcome.attempted, 0);
    assert_eq!(outcome.status(), OutcomeStatus::Success);
    assert!(journal.changes().is_empty());
}

#[test]
fn transfer_from_missing_inbox_fails() {
    let temp_dir = TempDir::new().unwrap();
    let journal = MemoryJournal::new();

    let result = transfer_reports(
        &temp_dir.path().join("absent"),
        temp_dir.path(),
        &journal,
    );
    assert!(matches!(result, Err(Error::DirectoryUnreadable { .. })));
}

#[test]
fn transfer_into_missing_dashboard_records_every_failure() {
    let temp_dir = TempDir::new().unwrap();
    let inbox = temp_dir.path().join("upload");
    fs::create_dir(&inbox).unwrap();
    write_file(inbox.join("report_Sales_2025-03-08.xml"), b"x");

    let journal = MemoryJournal::new();
    let outcome = transfer_reports(&inbox, &temp_dir.path().join("absent"), &journal).unwrap();

    assert_eq!(outcome.status(), OutcomeStatus::Failure);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].name, "report_Sales_2025-03-08.xml");
    assert!(inbox.join("report_Sales_2025-03-08.xml").exists());
    assert_eq!(journal.errors().len(), 1);
}

#[test]
fn transfer_writes_change_log_entry_with_owner() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    let report = layout.inbox.join("report_Sales_2025-03-08.xml");
    write_file(&report, b"<report/>");
    fs::set_permissions(&report, fs::Permissions::from_mode(0o640)).unwrap();
    let owner = owner_name(fs::metadata(&report).unwrap().uid());

    let journal = FileJournal::new(&layout);
    transfer_reports(&layout.inbox, &layout.dashboard, &journal).unwrap();

    let change_log = fs::read_to_string(layout.change_log()).unwrap();
    let lines: Vec<&str> = change_log.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].ends_with(&format!(
        "User: {owner}, File: report_Sales_2025-03-08.xml, Action: transfer"
    )));
}

#[test]
fn transfer_keeps_non_utf8_names_byte_for_byte() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    let name = OsStr::from_bytes(b"report_Sales_\xff.xml");
    write_file(layout.inbox.join(name), b"<sales/>");

    let journal = MemoryJournal::new();
    let outcome = transfer_reports(&layout.inbox, &layout.dashboard, &journal).unwrap();

    assert_eq!((outcome.succeeded, outcome.attempted), (1, 1));
    assert_eq!(raw_entry_names(&layout.dashboard), vec![name.to_os_string()]);
    assert_eq!(fs::read(layout.dashboard.join(name)).unwrap(), b"<sales/>");
    assert!(raw_entry_names(&layout.inbox).is_empty());
}
