//! Side channel for helper work reporting back to the scheduler.
//!
//! Senders enqueue [`NotifyEvent`]s from any thread; the scheduler drains
//! them without blocking once per poll quantum.

use crate::models::OutcomeStatus;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    BackupStart,
    BackupComplete,
    TransferStart,
    TransferComplete,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::BackupStart => "backup-start",
            EventKind::BackupComplete => "backup-complete",
            EventKind::TransferStart => "transfer-start",
            EventKind::TransferComplete => "transfer-complete",
            EventKind::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyEvent {
    pub kind: EventKind,
    /// Who sent it: a worker name or `scheduler`.
    pub origin: String,
    pub status: i32,
    pub message: String,
}

impl NotifyEvent {
    #[must_use]
    pub fn new(kind: EventKind, origin: &str, status: i32, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin: origin.to_string(),
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for NotifyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} (status {}): {}",
            self.kind, self.origin, self.status, self.message
        )
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<NotifyEvent>,
}

impl EventSender {
    /// Queue an event. Returns `false` when the receiving side is gone.
    pub fn enqueue(&self, event: NotifyEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::SendError(event)) => {
                log::warn!("Dropping event with no receiver: {event}");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct EventQueue {
    rx: Receiver<NotifyEvent>,
}

impl EventQueue {
    /// Next pending event, or `None` when nothing is queued. Never waits.
    pub fn try_dequeue(&self) -> Option<NotifyEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Every event queued so far.
    pub fn drain(&self) -> Vec<NotifyEvent> {
        std::iter::from_fn(|| self.try_dequeue()).collect()
    }
}

#[must_use]
pub fn event_channel() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventQueue { rx })
}

/// Run `job` on its own thread and send exactly one `kind` event with the
/// job's status when it finishes. A panicking job counts as a failure.
pub fn spawn_worker<F>(
    origin: &str,
    kind: EventKind,
    sender: EventSender,
    job: F,
) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce() -> OutcomeStatus + Send + 'static,
{
    let origin = origin.to_string();
    thread::Builder::new()
        .name(origin.clone())
        .spawn(move || {
            let status = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|_| {
                log::error!("Worker {origin} panicked");
                OutcomeStatus::Failure
            });
            let message = match status {
                OutcomeStatus::Success => "Operation completed successfully",
                OutcomeStatus::Partial => "Operation partially completed",
                OutcomeStatus::Failure => "Operation failed",
            };
            sender.enqueue(NotifyEvent::new(kind, &origin, status.code(), message));
        })
}
