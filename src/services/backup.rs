//! Backup operator: snapshot the dashboard into `backup/<timestamp>/`.

use crate::io::journal::Journal;
use crate::models::{BackupOutcome, BatchOutcome, OutcomeStatus};
use crate::services::{scan, transfer};
use crate::{Error, Result, checked_join};
use chrono::{DateTime, Local};
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

/// Directory name layout for one backup run (second granularity).
pub const BACKUP_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const BACKUP_DIR_MODE: u32 = 0o755;

#[must_use]
pub fn backup_dir_name(at: DateTime<Local>) -> String {
    at.format(BACKUP_DIR_FORMAT).to_string()
}

/// Copy every regular file of `dashboard` into a new directory below
/// `backup_root` named after `now`.
///
/// Fails with [`Error::BackupDirCreateFailed`] if that directory cannot be
/// created, including when it already exists.
pub fn backup_dashboard(
    dashboard: &Path,
    backup_root: &Path,
    now: DateTime<Local>,
    journal: &dyn Journal,
) -> Result<BackupOutcome> {
    journal.operation("Starting dashboard backup");

    let target = create_backup_dir(backup_root, now)?;
    let files = scan::list_files(dashboard, true)?;

    let mut batch = BatchOutcome::default();
    for file in &files {
        let display = file.display_name();
        let copied = checked_join(&target, &file.name)
            .and_then(|destination| transfer::copy_file(&file.path, &destination));

        match copied {
            Ok(bytes) => {
                log::trace!("Backed up {display} ({bytes} bytes)");
                batch.record_success();
            }
            Err(err) => {
                journal.error(&format!("Failed to backup file {display}: {err}"));
                batch.record_failure(&display, err.to_string());
            }
        }
    }

    match batch.status() {
        OutcomeStatus::Success => journal.operation(&format!(
            "Backup completed successfully: {} files",
            batch.succeeded
        )),
        OutcomeStatus::Partial | OutcomeStatus::Failure => journal.error(&format!(
            "Backup partially completed: {}/{} files",
            batch.succeeded, batch.attempted
        )),
    }

    Ok(BackupOutcome {
        directory: target,
        batch,
    })
}

fn create_backup_dir(backup_root: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    let target = checked_join(backup_root, &backup_dir_name(now))?;
    DirBuilder::new()
        .mode(BACKUP_DIR_MODE)
        .create(&target)
        .map_err(|source| Error::BackupDirCreateFailed {
            path: target.clone(),
            source,
        })?;
    Ok(target)
}
