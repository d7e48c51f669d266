//! File-backed journal appending to `operations.log`, `error.log` and `changes.log`.

use super::{Journal, format_change, format_error, format_operation};
use crate::config::Layout;
use crate::models::ChangeAction;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileJournal {
    operations: PathBuf,
    errors: PathBuf,
    changes: PathBuf,
}

impl FileJournal {
    #[must_use]
    pub fn new(layout: &Layout) -> Self {
        Self {
            operations: layout.operation_log(),
            errors: layout.error_log(),
            changes: layout.change_log(),
        }
    }

    fn append(path: &Path, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        // One write per line keeps O_APPEND writes from interleaving.
        file.write_all(format!("{line}\n").as_bytes())
    }
}

impl Journal for FileJournal {
    fn operation(&self, message: &str) {
        log::info!("{message}");
        let line = format_operation(Local::now(), message);
        if let Err(err) = Self::append(&self.operations, &line) {
            log::warn!(
                "Cannot append to {}: {err}",
                self.operations.display()
            );
        }
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
        let line = format_error(Local::now(), message);
        if let Err(err) = Self::append(&self.errors, &line) {
            log::warn!("Cannot append to {}: {err}", self.errors.display());
        }
    }

    fn change(&self, user: &str, filename: &str, action: ChangeAction, at: DateTime<Local>) {
        log::debug!("change: {action} {filename} by {user}");
        let line = format_change(at, user, filename, action);
        if let Err(err) = Self::append(&self.changes, &line) {
            self.error(&format!("Failed to open change log file: {err}"));
        }
    }
}
