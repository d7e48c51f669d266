//! Process signals mapped onto [`ControlHandle`] requests.
//!
//! | signal          | request              |
//! |-----------------|----------------------|
//! | SIGTERM, SIGINT | shutdown             |
//! | SIGUSR1         | manual backup        |
//! | SIGUSR2         | transfer cycle       |
//! | SIGHUP          | change detection     |
//!
//! Handlers only store into atomics; all work happens on the next tick.

use super::ControlHandle;
use crate::{Error, Result};
use std::sync::OnceLock;

static CONTROL: OnceLock<ControlHandle> = OnceLock::new();

const HANDLED: [libc::c_int; 5] = [
    libc::SIGTERM,
    libc::SIGINT,
    libc::SIGUSR1,
    libc::SIGUSR2,
    libc::SIGHUP,
];

extern "C" fn on_signal(signal: libc::c_int) {
    let Some(control) = CONTROL.get() else {
        return;
    };
    match signal {
        libc::SIGTERM | libc::SIGINT => control.request_shutdown(),
        libc::SIGUSR1 => control.request_backup(),
        libc::SIGUSR2 => control.request_cycle(),
        libc::SIGHUP => control.request_detection(),
        _ => {}
    }
}

/// Route the handled signals to `control`. Can be called once per process.
pub fn install(control: &ControlHandle) -> Result<()> {
    if CONTROL.set(control.clone()).is_err() {
        return Err(Error::InvalidInput(
            "signal handlers are already installed".to_string(),
        ));
    }

    for signal in HANDLED {
        // SAFETY: the action is fully initialised before being passed in and
        // the handler only touches atomics.
        let rc = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signal, &action, std::ptr::null_mut())
        };
        if rc != 0 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }
    }

    Ok(())
}
