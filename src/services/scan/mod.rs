//! Filesystem snapshot reader.
//!
//! Lists a single directory (no recursion) and stats its entries in
//! parallel. The resulting [`Snapshot`] holds only regular, non-hidden files;
//! entries that fail to stat are skipped and recorded in `Snapshot::errors`
//! rather than failing the whole scan.

pub mod owner;
pub mod posix;

use crate::models::{FileRecord, ScanError, Snapshot};
use crate::services::naming;
use crate::{Error, Result};
use chrono::Local;
use owner::OwnerCache;
use posix::RawEntry;
use rayon::prelude::*;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// A regular file found in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirFile {
    pub name: OsString,
    pub path: PathBuf,
}

impl DirFile {
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// Snapshot the regular, non-hidden files of `dir`.
pub fn read_snapshot<P: AsRef<Path>>(dir: P) -> Result<Snapshot> {
    let dir = dir.as_ref();
    let taken_at = Local::now();

    let entries = list_raw(dir)?;
    let candidates: Vec<RawEntry> = entries
        .into_iter()
        .filter(|entry| !entry.is_dir && !entry.is_hidden())
        .collect();

    let stats: Vec<(RawEntry, std::io::Result<fs::Metadata>)> = candidates
        .into_par_iter()
        .map(|entry| {
            let meta = fs::metadata(&entry.path);
            (entry, meta)
        })
        .collect();

    let mut owners = OwnerCache::new();
    let mut snapshot = Snapshot::empty(dir.to_path_buf(), taken_at);

    for (entry, meta) in stats {
        match meta {
            Ok(meta) if meta.is_file() => {
                let filename = entry.display_name();
                let department = if naming::is_report_file(&filename) {
                    naming::department_from_filename(&filename).map(str::to_string)
                } else {
                    None
                };

                snapshot.files.push(FileRecord {
                    owner: owners.resolve(meta.uid()),
                    modified: meta.mtime(),
                    size: meta.len(),
                    department,
                    filename,
                    path: entry.path,
                });
            }
            Ok(_) => {}
            Err(err) => {
                log::warn!("Failed to get file stats for {}: {err}", entry.display_name());
                snapshot.errors.push(ScanError::from_io(&entry.path, &err));
            }
        }
    }

    snapshot.files.sort_by(|a, b| a.name().cmp(b.name()));
    log::debug!(
        "Scanned {}: {} files, {} skipped",
        dir.display(),
        snapshot.files.len(),
        snapshot.errors.len()
    );

    Ok(snapshot)
}

/// Regular files of `dir`, sorted by name. Hidden files are kept when
/// `include_hidden` is set. Entries that cannot be stat'ed are skipped.
pub fn list_files<P: AsRef<Path>>(dir: P, include_hidden: bool) -> Result<Vec<DirFile>> {
    let dir = dir.as_ref();
    let mut files: Vec<DirFile> = list_raw(dir)?
        .into_iter()
        .filter(|entry| !entry.is_dir && (include_hidden || !entry.is_hidden()))
        .filter(|entry| match fs::metadata(&entry.path) {
            Ok(meta) => meta.is_file(),
            Err(err) => {
                log::warn!("Failed to get file stats for {}: {err}", entry.display_name());
                false
            }
        })
        .map(|entry| DirFile {
            name: entry.name,
            path: entry.path,
        })
        .collect();

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn list_raw(dir: &Path) -> Result<Vec<RawEntry>> {
    posix::list_entries(dir).map_err(|source| Error::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    })
}
