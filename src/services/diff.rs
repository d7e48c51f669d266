//! Snapshot differ and per-directory change tracking.
//!
//! Comparison is by filename and modification time only. A file whose
//! content changes without its mtime moving forward (same-second rewrite,
//! restore with an older mtime) is reported as unchanged.

use crate::models::{ChangeAction, ChangeEvent, FileRecord, Snapshot};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;

/// Compare two snapshots of the same directory.
///
/// Created and modified events follow `current` order, deletions follow
/// `previous` order. Files are matched by their on-disk name, and each
/// yields at most one event.
#[must_use]
pub fn diff_snapshots(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
    let before: HashMap<&OsStr, &FileRecord> =
        previous.files.iter().map(|f| (f.name(), f)).collect();
    let after: HashMap<&OsStr, &FileRecord> =
        current.files.iter().map(|f| (f.name(), f)).collect();

    let at = current.taken_at;
    let mut events = Vec::new();

    for file in &current.files {
        let action = match before.get(file.name()) {
            None => Some(ChangeAction::Created),
            Some(old) if file.modified > old.modified => Some(ChangeAction::Modified),
            Some(_) => None,
        };

        if let Some(action) = action {
            events.push(ChangeEvent {
                filename: file.filename.clone(),
                user: file.owner.clone(),
                action,
                timestamp: at,
            });
        }
    }

    for file in &previous.files {
        if !after.contains_key(file.name()) {
            events.push(ChangeEvent {
                filename: file.filename.clone(),
                user: file.owner.clone(),
                action: ChangeAction::Deleted,
                timestamp: at,
            });
        }
    }

    events
}

/// Holds the previous snapshot of every monitored directory.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    previous: HashMap<PathBuf, Snapshot>,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `current` against the stored snapshot of its directory and keep
    /// `current` as the new baseline. Returns `None` on the first pass.
    pub fn observe(&mut self, current: Snapshot) -> Option<Vec<ChangeEvent>> {
        let events = self
            .previous
            .get(&current.directory)
            .map(|previous| diff_snapshots(previous, &current));
        self.previous.insert(current.directory.clone(), current);
        events
    }

    #[must_use]
    pub fn baseline(&self, directory: &std::path::Path) -> Option<&Snapshot> {
        self.previous.get(directory)
    }

    /// Forget every baseline; the next pass re-establishes them silently.
    pub fn reset(&mut self) {
        self.previous.clear();
    }
}
