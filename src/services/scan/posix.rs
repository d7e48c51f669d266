//! Directory listing through `rustix` primitives.

use rustix::fs::{self as rfs, Dir, FileType, Mode, OFlags};
use std::ffi::OsString;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

/// One raw directory entry, before any stat call.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// Name bytes exactly as the directory holds them.
    pub name: OsString,
    pub path: PathBuf,
    /// The dirent type said "directory". Unknown types are resolved by stat later.
    pub is_dir: bool,
}

impl RawEntry {
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.name.as_bytes().starts_with(b".")
    }

    /// Lossy UTF-8 form, for display and logs only.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// List the entries of `dir`, skipping `.` and `..`.
///
/// Fails only when the directory itself cannot be opened or read; a bad
/// entry mid-stream is logged and skipped.
pub fn list_entries(dir: &Path) -> io::Result<Vec<RawEntry>> {
    let dir_fd = rfs::openat(
        rfs::CWD,
        dir,
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
        Mode::empty(),
    )
    .map_err(io::Error::from)?;

    let dir_iter = Dir::read_from(&dir_fd).map_err(io::Error::from)?;
    let mut entries = Vec::new();

    for entry_result in dir_iter {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let io_err: io::Error = err.into();
                log::warn!("Failed to read entry in {}: {io_err}", dir.display());
                continue;
            }
        };

        let name_bytes = entry.file_name().to_bytes();
        if name_bytes == b"." || name_bytes == b".." {
            continue;
        }

        let child_name = OsString::from_vec(name_bytes.to_vec());
        let path = dir.join(&child_name);
        entries.push(RawEntry {
            name: child_name,
            path,
            is_dir: entry.file_type() == FileType::Directory,
        });
    }

    Ok(entries)
}
