//! Report Collection Daemon Library
//!
//! This library moves department report files from an inbox directory to a
//! shared dashboard on a daily schedule, snapshots the dashboard into
//! timestamped backups, detects missing submissions, and keeps an audit trail
//! of every file creation, modification, deletion and transfer.

#[cfg(not(unix))]
compile_error!("reportd relies on POSIX permissions, ownership and signals");

pub mod cli;
pub mod config;
pub mod daemon;
pub mod io;
pub mod models;
pub mod services;

pub use config::{DaemonConfig, Layout, LockModes};
pub use models::{
    BackupOutcome, BatchOutcome, ChangeAction, ChangeEvent, FailedItem, FileRecord,
    OutcomeStatus, ScanError, Snapshot, TransferOutcome,
};

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::result;

/// Longest path the operators will build before refusing with [`Error::PathTooLong`].
pub const MAX_PATH_LEN: usize = 4096;

/// Custom error type for the library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Directory unreadable: {}: {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transfer failed for {}: {reason}", .path.display())]
    TransferFailed { path: PathBuf, reason: String },

    #[error("Copy failed from {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create backup directory {}: {source}", .path.display())]
    BackupDirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock {}: {source}", .path.display())]
    LockFailed {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to unlock {}: {source}", .path.display())]
    UnlockFailed {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Permission denied: {operation} {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        operation: &'static str,
    },

    #[error("Path exceeds {limit} bytes: {path}")]
    PathTooLong { path: String, limit: usize },

    #[error("Another instance is already running (pid file {})", .pid_file.display())]
    AlreadyRunning { pid_file: PathBuf },

    #[error("Failed to detach from terminal: {0}")]
    Daemonize(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify an I/O failure on `path`, surfacing OS permission refusals
    /// as [`Error::PermissionDenied`].
    pub(crate) fn from_io(path: &Path, operation: &'static str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Error::PermissionDenied {
                path: path.to_path_buf(),
                operation,
            }
        } else {
            Error::Io(err)
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Join `name` onto `dir`, refusing results longer than [`MAX_PATH_LEN`].
pub fn checked_join<N: AsRef<OsStr>>(dir: &Path, name: N) -> Result<PathBuf> {
    let joined = dir.join(name.as_ref());
    let len = joined.as_os_str().len();
    if len > MAX_PATH_LEN {
        return Err(Error::PathTooLong {
            path: joined.to_string_lossy().into_owned(),
            limit: MAX_PATH_LEN,
        });
    }
    Ok(joined)
}
