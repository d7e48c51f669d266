//! File owner resolution (uid → user name).

use std::collections::HashMap;
use std::ffi::CStr;

/// Owner names longer than this are truncated for display.
pub const MAX_OWNER_LEN: usize = 255;

const INITIAL_BUFFER: usize = 1024;
const MAX_BUFFER: usize = 64 * 1024;

/// Per-scan cache so a directory full of one user's files costs one lookup.
#[derive(Debug, Default)]
pub struct OwnerCache {
    names: HashMap<u32, String>,
}

impl OwnerCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, uid: u32) -> String {
        self.names.entry(uid).or_insert_with(|| owner_name(uid)).clone()
    }
}

/// User name for `uid`, or the numeric id when the account cannot be found.
#[must_use]
pub fn owner_name(uid: u32) -> String {
    match lookup_user_name(uid) {
        Some(name) => truncate_for_display(name),
        None => {
            log::debug!("No passwd entry for uid {uid}; recording numeric owner");
            uid.to_string()
        }
    }
}

fn truncate_for_display(mut name: String) -> String {
    if name.len() > MAX_OWNER_LEN {
        let mut cut = MAX_OWNER_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

fn lookup_user_name(uid: u32) -> Option<String> {
    let mut buf: Vec<libc::c_char> = vec![0; INITIAL_BUFFER];

    loop {
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
            buf.resize(buf.len() * 2, 0);
            continue;
        }

        if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
            return None;
        }

        // pw_name points into `buf`, which is still alive here.
        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}
