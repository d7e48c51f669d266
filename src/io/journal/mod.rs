//! Audit journal sinks for the operation, error and change logs.
//!
//! Every method is write-once and infallible from the caller's point of view:
//! a sink that cannot persist a line reports it through the `log` facade and
//! carries on.

use crate::models::{ChangeAction, ChangeEvent};
use chrono::{DateTime, Local};
use std::sync::Arc;

pub mod file;
pub mod memory;

pub use file::FileJournal;
pub use memory::MemoryJournal;

/// Timestamp layout used by every journal line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Trait implemented by sinks receiving audit lines.
pub trait Journal: Send + Sync {
    /// Record a cycle-level operation.
    fn operation(&self, message: &str);

    /// Record a failure.
    fn error(&self, message: &str);

    /// Record one file change attributed to `user`.
    fn change(&self, user: &str, filename: &str, action: ChangeAction, at: DateTime<Local>);

    fn change_event(&self, event: &ChangeEvent) {
        self.change(&event.user, &event.filename, event.action, event.timestamp);
    }
}

pub type SharedJournal = Arc<dyn Journal>;

#[must_use]
pub fn format_operation(at: DateTime<Local>, message: &str) -> String {
    format!("[{}] INFO: {message}", at.format(TIMESTAMP_FORMAT))
}

#[must_use]
pub fn format_error(at: DateTime<Local>, message: &str) -> String {
    format!("[{}] ERROR: {message}", at.format(TIMESTAMP_FORMAT))
}

#[must_use]
pub fn format_change(
    at: DateTime<Local>,
    user: &str,
    filename: &str,
    action: ChangeAction,
) -> String {
    format!(
        "[{}] User: {user}, File: {filename}, Action: {action}",
        at.format(TIMESTAMP_FORMAT)
    )
}
