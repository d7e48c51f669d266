//! File transfer operator: copy, move, and the inbox → dashboard batch.

use crate::io::journal::Journal;
use crate::models::{ChangeAction, TransferOutcome};
use crate::services::{naming, scan};
use crate::{Error, Result, checked_join};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Bytes moved per read/write round.
pub const COPY_CHUNK: usize = 4096;

const COPY_MODE: u32 = 0o644;

/// Copy `source` into `destination`, creating or truncating it.
///
/// A failure part-way leaves a partial destination behind. Returns the
/// number of bytes copied.
pub fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
    let mut input =
        File::open(source).map_err(|err| open_error(source, source, destination, err))?;
    let mut output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(COPY_MODE)
        .open(destination)
        .map_err(|err| open_error(destination, source, destination, err))?;

    let copy_failed = |source_err| Error::CopyFailed {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: source_err,
    };

    let mut buffer = [0u8; COPY_CHUNK];
    let mut total = 0u64;

    loop {
        let read = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(copy_failed(err)),
        };

        output.write_all(&buffer[..read]).map_err(copy_failed)?;
        total += read as u64;
    }

    output.flush().map_err(copy_failed)?;
    Ok(total)
}

fn open_error(failed: &Path, source: &Path, destination: &Path, err: std::io::Error) -> Error {
    match Error::from_io(failed, "open", err) {
        Error::Io(io_err) => Error::CopyFailed {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: io_err,
        },
        denied => denied,
    }
}

/// Move `source` to `destination`: atomic rename when possible, otherwise
/// copy then remove the source.
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) => {
            log::debug!(
                "rename {} -> {} failed ({err}); falling back to copy",
                source.display(),
                destination.display()
            );
            copy_then_remove(source, destination)
        }
    }
}

/// The non-atomic half of [`move_file`].
///
/// When the copy succeeds but the source cannot be removed, both files
/// exist and the error says so.
pub fn copy_then_remove(source: &Path, destination: &Path) -> Result<()> {
    copy_file(source, destination).map_err(|err| Error::TransferFailed {
        path: source.to_path_buf(),
        reason: err.to_string(),
    })?;

    fs::remove_file(source).map_err(|err| Error::TransferFailed {
        path: source.to_path_buf(),
        reason: format!(
            "copied to {} but failed to delete source: {err}",
            destination.display()
        ),
    })
}

/// Move every report file from `inbox` to `dashboard`.
///
/// Per-file failures are logged and counted; they do not stop the batch.
/// Each successful move is written to the change log as a `transfer` by the
/// file's owner.
pub fn transfer_reports(
    inbox: &Path,
    dashboard: &Path,
    journal: &dyn Journal,
) -> Result<TransferOutcome> {
    journal.operation("Starting report transfer from upload to dashboard");

    let snapshot = scan::read_snapshot(inbox)?;
    for skipped in &snapshot.errors {
        journal.error(&format!(
            "Failed to get file stats for {}: {}",
            skipped.path, skipped.message
        ));
    }

    let mut outcome = TransferOutcome::default();

    for file in snapshot
        .files
        .iter()
        .filter(|f| naming::is_report_file(&f.filename))
    {
        let destination = match checked_join(dashboard, file.name()) {
            Ok(path) => path,
            Err(err) => {
                journal.error(&format!("Failed to move file {}: {err}", file.filename));
                outcome.record_failure(&file.filename, err.to_string());
                continue;
            }
        };

        journal.operation(&format!(
            "Moving file: {} to {}",
            file.filename,
            dashboard.display()
        ));

        match move_file(&file.path, &destination) {
            Ok(()) => {
                outcome.record_success();
                journal.change(
                    &file.owner,
                    &file.filename,
                    ChangeAction::Transferred,
                    Local::now(),
                );
            }
            Err(err) => {
                journal.error(&format!(
                    "Failed to move file {} to dashboard: {err}",
                    file.filename
                ));
                outcome.record_failure(&file.filename, err.to_string());
            }
        }
    }

    Ok(outcome)
}
