//! Single-instance guard backed by an advisory `flock` on the pid file.

use crate::{Error, Result};
use rustix::fs::{FlockOperation, flock};
use rustix::io::Errno;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Holds the lock for as long as it lives; the file is removed on drop.
#[derive(Debug)]
pub struct PidGuard {
    path: PathBuf,
    file: File,
}

impl PidGuard {
    /// Lock `path` and write the current pid into it.
    ///
    /// Fails with [`Error::AlreadyRunning`] when another process (or another
    /// guard in this one) holds the lock.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o644)
            .open(path)?;

        match flock(&file, FlockOperation::NonBlockingLockExclusive) {
            Ok(()) => {}
            Err(errno) if errno == Errno::WOULDBLOCK => {
                return Err(Error::AlreadyRunning {
                    pid_file: path.to_path_buf(),
                });
            }
            Err(errno) => return Err(Error::Io(errno.into())),
        }

        let mut guard = Self {
            path: path.to_path_buf(),
            file,
        };
        guard.write_pid()?;
        Ok(guard)
    }

    /// Rewrite the file with the current pid. Needed again after forking
    /// into the background.
    pub fn write_pid(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        writeln!(self.file, "{}", std::process::id())?;
        self.file.sync_all()?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove pid file {}: {err}", self.path.display());
        }
    }
}

/// Pid recorded in `path`, if it holds one.
#[must_use]
pub fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}
