//! Directory lock controller.
//!
//! "Locking" strips the access bits from the inbox and dashboard so normal
//! submitters cannot write during a transfer or backup. It is advisory: a
//! privileged process can still race it, and nothing here prevents that.

use crate::config::LockModes;
use crate::{Error, Result};
use rustix::fs::{Mode, RawMode};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
}

/// Per-directory result of one lock or unlock attempt.
#[derive(Debug, Default)]
pub struct LockReport {
    pub failures: Vec<Error>,
    pub attempted: usize,
}

impl LockReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
struct Guarded {
    path: PathBuf,
    unlocked_mode: u32,
    /// Mode observed right before a successful lock.
    saved_mode: Option<u32>,
}

#[derive(Debug)]
pub struct DirectoryLock {
    dirs: [Guarded; 2],
    locked_mode: u32,
    state: LockState,
}

impl DirectoryLock {
    #[must_use]
    pub fn new(inbox: &Path, dashboard: &Path, modes: LockModes) -> Self {
        Self {
            dirs: [
                Guarded {
                    path: inbox.to_path_buf(),
                    unlocked_mode: modes.inbox,
                    saved_mode: None,
                },
                Guarded {
                    path: dashboard.to_path_buf(),
                    unlocked_mode: modes.dashboard,
                    saved_mode: None,
                },
            ],
            locked_mode: modes.locked,
            state: LockState::Unlocked,
        }
    }

    #[must_use]
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Apply the locked mode to both directories. A failure on one does not
    /// stop the attempt on the other. The state only moves to `Locked` when
    /// at least one directory was locked.
    pub fn lock(&mut self) -> LockReport {
        let mut report = LockReport::default();

        for dir in &mut self.dirs {
            report.attempted += 1;
            let before = current_mode(&dir.path).ok();

            match set_directory_mode(&dir.path, self.locked_mode) {
                Ok(()) => {
                    // Keep the first observation if we are re-locking.
                    if dir.saved_mode.is_none() {
                        dir.saved_mode = before;
                    }
                }
                Err(err) => report.failures.push(Error::LockFailed {
                    path: dir.path.clone(),
                    source: Box::new(err),
                }),
            }
        }

        if report.failures.len() < report.attempted {
            self.state = LockState::Locked;
        }
        report
    }

    /// Restore the mode each directory had before [`lock`](Self::lock), or
    /// the configured unlocked mode when none was recorded.
    pub fn unlock(&mut self) -> LockReport {
        let mut report = LockReport::default();

        for dir in &mut self.dirs {
            report.attempted += 1;
            let mode = dir.saved_mode.unwrap_or(dir.unlocked_mode);

            match set_directory_mode(&dir.path, mode) {
                Ok(()) => dir.saved_mode = None,
                Err(err) => report.failures.push(Error::UnlockFailed {
                    path: dir.path.clone(),
                    source: Box::new(err),
                }),
            }
        }

        if report.is_ok() {
            self.state = LockState::Unlocked;
        }
        report
    }

    /// Put both directories into their configured unlocked modes, forgetting
    /// anything recorded by a previous lock.
    pub fn reset_modes(&mut self) -> LockReport {
        for dir in &mut self.dirs {
            dir.saved_mode = None;
        }
        self.unlock()
    }
}

/// `chmod` a directory, surfacing refusals as [`Error::PermissionDenied`].
pub fn set_directory_mode(path: &Path, mode: u32) -> Result<()> {
    rustix::fs::chmod(path, Mode::from_raw_mode(mode as RawMode))
        .map_err(|errno| Error::from_io(path, "chmod", std::io::Error::from(errno)))
}

/// Permission bits (including setuid/setgid/sticky) of `path`.
pub fn current_mode(path: &Path) -> Result<u32> {
    let meta = fs::metadata(path)?;
    Ok(meta.permissions().mode() & 0o7777)
}
