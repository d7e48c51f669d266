//! Data models for file records, snapshots, change events and batch outcomes

use chrono::{DateTime, Local};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;

/// One observed file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Lossy UTF-8 form of the name; [`FileRecord::name`] is the real one.
    pub filename: String,
    /// Department derived from the report naming convention, if any.
    pub department: Option<String>,
    /// Modification time, unix seconds.
    pub modified: i64,
    pub owner: String,
    pub size: u64,
}

/// Point-in-time listing of the regular, non-hidden files of one directory.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub directory: PathBuf,
    pub taken_at: DateTime<Local>,
    pub files: Vec<FileRecord>,
    /// Entries skipped because they could not be stat'ed.
    pub errors: Vec<ScanError>,
}

impl FileRecord {
    /// Name as stored on disk. Keys and destination paths use this.
    #[must_use]
    pub fn name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }
}

impl Snapshot {
    #[must_use]
    pub fn empty(directory: PathBuf, taken_at: DateTime<Local>) -> Self {
        Self {
            directory,
            taken_at,
            files: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.filename == filename)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Represents an entry skipped during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanError {
    pub path: String,
    pub code: String,
    pub message: String,
}

impl ScanError {
    #[must_use]
    pub fn from_io(path: &std::path::Path, error: &std::io::Error) -> Self {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => "ENOENT",
            std::io::ErrorKind::PermissionDenied => "EACCES",
            _ => "IO",
        };

        Self {
            path: path.to_string_lossy().to_string(),
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Modified,
    Deleted,
    Transferred,
}

impl ChangeAction {
    /// Verb written to the change log.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "create",
            ChangeAction::Modified => "modify",
            ChangeAction::Deleted => "delete",
            ChangeAction::Transferred => "transfer",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A created/modified/deleted classification produced by diffing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub filename: String,
    /// Best-effort, from file ownership.
    pub user: String,
    pub action: ChangeAction,
    pub timestamp: DateTime<Local>,
}

/// One item of a batch that did not make it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Partial,
    Failure,
}

impl OutcomeStatus {
    /// Status code carried by side-channel completion events.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            OutcomeStatus::Success => 0,
            OutcomeStatus::Partial => 1,
            OutcomeStatus::Failure => -1,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Partial => "partial",
            OutcomeStatus::Failure => "failure",
        })
    }
}

/// Aggregate result of a per-file batch (transfer or backup copy).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<FailedItem>,
}

impl BatchOutcome {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, name: &str, reason: impl Into<String>) {
        self.attempted += 1;
        self.failures.push(FailedItem {
            name: name.to_string(),
            reason: reason.into(),
        });
    }

    /// `Failure` only when something was attempted and nothing succeeded.
    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        if self.succeeded == self.attempted {
            OutcomeStatus::Success
        } else if self.succeeded == 0 {
            OutcomeStatus::Failure
        } else {
            OutcomeStatus::Partial
        }
    }
}

pub type TransferOutcome = BatchOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupOutcome {
    pub directory: PathBuf,
    pub batch: BatchOutcome,
}

impl BackupOutcome {
    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        self.batch.status()
    }
}
