//! The scheduler loop tying the operators together.
//!
//! One [`Scheduler::tick`] per poll quantum, in this order:
//!
//! 1. drain the side channel and journal what arrived
//! 2. the daily (or forced) transfer-and-backup cycle
//! 3. a forced manual backup, run on a worker thread
//! 4. interval-gated change detection
//!
//! The cycle runs synchronously, so nothing else the scheduler owns can
//! interleave with it. While a manual backup worker is in flight, new cycles
//! and detection passes are deferred and their requests stay latched.

pub mod control;
pub mod pidfile;
pub mod schedule;
pub mod signals;

pub use control::ControlHandle;
pub use pidfile::PidGuard;
pub use schedule::{CycleSchedule, DetectionGate};

use crate::config::{DaemonConfig, Layout, LockModes};
use crate::io::journal::{Journal, SharedJournal};
use crate::models::{BackupOutcome, ChangeEvent, OutcomeStatus, TransferOutcome};
use crate::services::backup::backup_dashboard;
use crate::services::diff::ChangeTracker;
use crate::services::lock::{DirectoryLock, LockReport};
use crate::services::missing::check_missing;
use crate::services::notify::{
    EventKind, EventQueue, EventSender, NotifyEvent, event_channel, spawn_worker,
};
use crate::services::scan;
use crate::services::transfer::transfer_reports;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

const SCHEDULER_ORIGIN: &str = "scheduler";
const MANUAL_BACKUP_ORIGIN: &str = "manual-backup";

/// What one transfer-and-backup cycle did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub lock_failures: Vec<String>,
    pub transfer: Option<TransferOutcome>,
    pub transfer_error: Option<String>,
    /// Number of expected departments without a report, if the dashboard
    /// could be read.
    pub missing: Option<usize>,
    pub backup: Option<BackupOutcome>,
    pub backup_error: Option<String>,
    pub unlock_failures: Vec<String>,
}

impl CycleReport {
    /// `Failure` when both the transfer and the backup failed outright,
    /// `Partial` when anything at all went wrong.
    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        if self.transfer_error.is_some() && self.backup_error.is_some() {
            return OutcomeStatus::Failure;
        }

        let clean = self.transfer_error.is_none()
            && self.backup_error.is_none()
            && self.lock_failures.is_empty()
            && self.unlock_failures.is_empty()
            && self
                .transfer
                .as_ref()
                .is_none_or(|t| t.status() == OutcomeStatus::Success)
            && self
                .backup
                .as_ref()
                .is_none_or(|b| b.status() == OutcomeStatus::Success);

        if clean {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Partial
        }
    }
}

/// What a single [`Scheduler::tick`] did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<NotifyEvent>,
    pub cycle: Option<CycleReport>,
    pub backup_started: bool,
    /// `Some` when a detection pass ran, even if it found nothing.
    pub changes: Option<Vec<ChangeEvent>>,
}

pub struct Scheduler {
    config: DaemonConfig,
    layout: Layout,
    control: ControlHandle,
    journal: SharedJournal,
    lock: DirectoryLock,
    tracker: ChangeTracker,
    schedule: CycleSchedule,
    detection: DetectionGate,
    sender: EventSender,
    queue: EventQueue,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: DaemonConfig, control: ControlHandle, journal: SharedJournal) -> Self {
        let layout = config.layout();
        let lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, config.modes);
        let schedule = CycleSchedule::new(config.transfer_at);
        let detection = DetectionGate::new(config.detection_interval);
        let (sender, queue) = event_channel();

        Self {
            config,
            layout,
            control,
            journal,
            lock,
            tracker: ChangeTracker::new(),
            schedule,
            detection,
            sender,
            queue,
            worker: None,
        }
    }

    /// Loop until shutdown is requested, then wait for any in-flight worker.
    pub fn run(&mut self) {
        self.journal.operation("Entering main daemon loop");

        while !self.control.shutdown_requested() {
            self.tick(Local::now(), Instant::now());
            thread::sleep(self.config.poll_quantum);
        }

        self.journal.operation("Shutdown requested");
        if let Some(handle) = self.worker.take() {
            self.journal
                .operation("Waiting for manual backup to finish");
            if handle.join().is_err() {
                self.journal.error("Manual backup worker panicked");
            }
        }
        self.drain_events();
    }

    /// Evaluate every trigger once.
    pub fn tick(&mut self, now: DateTime<Local>, instant: Instant) -> TickReport {
        let mut report = TickReport {
            events: self.drain_events(),
            ..TickReport::default()
        };
        self.reap_worker();
        let busy = self.worker_busy();

        let wall = now.naive_local();
        let scheduled = self.schedule.is_due(wall);
        if scheduled {
            self.schedule.mark_run(wall);
        }

        if busy {
            if scheduled {
                self.journal
                    .operation("Scheduled cycle deferred until manual backup finishes");
                self.control.request_cycle();
            }
            return report;
        }

        let forced = self.control.take_cycle_request();
        if scheduled || forced {
            report.cycle = Some(self.run_cycle(now));
        }

        // The cycle's backup directory is named after `now`; a manual backup
        // in the same tick would collide with it.
        if report.cycle.is_none() && self.control.take_backup_request() {
            match self.start_manual_backup() {
                Ok(()) => report.backup_started = true,
                Err(err) => self
                    .journal
                    .error(&format!("Failed to start manual backup: {err}")),
            }
        }

        let due = self.detection.is_due(instant);
        let requested = self.control.take_detection_request();
        if due || requested {
            self.detection.mark(instant);
            report.changes = Some(self.run_change_detection());
        }

        report
    }

    /// Lock, transfer, check for missing reports, back up, unlock.
    ///
    /// Unlock is attempted no matter what failed before it.
    pub fn run_cycle(&mut self, now: DateTime<Local>) -> CycleReport {
        let journal = self.journal.as_ref();
        journal.operation("Starting scheduled file transfer and backup");

        let mut report = CycleReport::default();

        let locked = self.lock.lock();
        report.lock_failures = journal_lock_report(journal, &locked, "Directories locked");

        self.emit(EventKind::TransferStart, 0, "Report transfer started");
        match transfer_reports(&self.layout.inbox, &self.layout.dashboard, journal) {
            Ok(outcome) => {
                match outcome.status() {
                    OutcomeStatus::Success => journal.operation(&format!(
                        "File transfer completed successfully: {} files",
                        outcome.succeeded
                    )),
                    OutcomeStatus::Partial | OutcomeStatus::Failure => journal.error(&format!(
                        "File transfer partially completed: {}/{} files",
                        outcome.succeeded, outcome.attempted
                    )),
                }
                self.emit(
                    EventKind::TransferComplete,
                    outcome.status().code(),
                    format!("{}/{} files moved", outcome.succeeded, outcome.attempted),
                );
                report.transfer = Some(outcome);
            }
            Err(err) => {
                journal.error(&format!("File transfer failed: {err}"));
                self.emit(
                    EventKind::TransferComplete,
                    OutcomeStatus::Failure.code(),
                    err.to_string(),
                );
                report.transfer_error = Some(err.to_string());
            }
        }

        report.missing = match scan::read_snapshot(&self.layout.dashboard) {
            Ok(snapshot) => Some(check_missing(
                &snapshot,
                &self.config.expected_departments,
                journal,
            )),
            Err(err) => {
                journal.error(&format!("Missing report check failed: {err}"));
                None
            }
        };

        self.emit(EventKind::BackupStart, 0, "Dashboard backup started");
        match backup_dashboard(&self.layout.dashboard, &self.layout.backup, now, journal) {
            Ok(outcome) => {
                self.emit(
                    EventKind::BackupComplete,
                    outcome.status().code(),
                    format!(
                        "{}/{} files copied to {}",
                        outcome.batch.succeeded,
                        outcome.batch.attempted,
                        outcome.directory.display()
                    ),
                );
                report.backup = Some(outcome);
            }
            Err(err) => {
                journal.error(&format!("Backup failed: {err}"));
                self.emit(
                    EventKind::BackupComplete,
                    OutcomeStatus::Failure.code(),
                    err.to_string(),
                );
                report.backup_error = Some(err.to_string());
            }
        }

        let unlocked = self.lock.unlock();
        report.unlock_failures = journal_lock_report(journal, &unlocked, "Directories unlocked");

        journal.operation(&format!("Scheduled cycle finished: {}", report.status()));
        report
    }

    /// Snapshot every watched directory and journal what changed since the
    /// previous pass. The first pass over a directory only records a baseline.
    pub fn run_change_detection(&mut self) -> Vec<ChangeEvent> {
        let mut changes = Vec::new();

        for dir in self.watched_dirs() {
            let snapshot = match scan::read_snapshot(&dir) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    // Keep the previous baseline so the next pass diffs against it.
                    self.journal
                        .error(&format!("Change detection skipped: {err}"));
                    continue;
                }
            };

            for skipped in &snapshot.errors {
                self.journal.error(&format!(
                    "Failed to get file stats for {}: {}",
                    skipped.path, skipped.message
                ));
            }

            if let Some(events) = self.tracker.observe(snapshot) {
                for event in &events {
                    self.journal.change_event(event);
                }
                changes.extend(events);
            }
        }

        changes
    }

    /// Journal and return every event queued on the side channel.
    pub fn drain_events(&self) -> Vec<NotifyEvent> {
        let events = self.queue.drain();
        for event in &events {
            if event.kind == EventKind::Error || event.status < 0 {
                self.journal.error(&format!("Event {event}"));
            } else {
                self.journal.operation(&format!("Event {event}"));
            }
        }
        events
    }

    /// Whether a manual backup worker is still running.
    #[must_use]
    pub fn worker_busy(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Block until the in-flight worker, if any, has finished.
    pub fn wait_for_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                self.journal.error("Manual backup worker panicked");
            }
        }
    }

    fn watched_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.layout.inbox.clone()];
        if self.config.watch_dashboard {
            dirs.push(self.layout.dashboard.clone());
        }
        dirs
    }

    fn reap_worker(&mut self) {
        if self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
            self.wait_for_worker();
        }
    }

    fn start_manual_backup(&mut self) -> Result<()> {
        let layout = self.layout.clone();
        let modes = self.config.modes;
        let journal = Arc::clone(&self.journal);

        self.sender.enqueue(NotifyEvent::new(
            EventKind::BackupStart,
            MANUAL_BACKUP_ORIGIN,
            0,
            "Manual backup started",
        ));

        let handle = spawn_worker(
            MANUAL_BACKUP_ORIGIN,
            EventKind::BackupComplete,
            self.sender.clone(),
            move || match manual_backup(&layout, modes, Local::now(), journal.as_ref()) {
                Ok(outcome) => outcome.status(),
                Err(_) => OutcomeStatus::Failure,
            },
        )?;

        self.worker = Some(handle);
        Ok(())
    }

    fn emit(&self, kind: EventKind, status: i32, message: impl Into<String>) {
        self.sender
            .enqueue(NotifyEvent::new(kind, SCHEDULER_ORIGIN, status, message));
    }
}

/// Lock, back up the dashboard, unlock. Used for forced backups outside the
/// daily cycle.
pub fn manual_backup(
    layout: &Layout,
    modes: LockModes,
    now: DateTime<Local>,
    journal: &dyn Journal,
) -> Result<BackupOutcome> {
    journal.operation("Starting manual backup");

    let mut lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, modes);
    journal_lock_report(journal, &lock.lock(), "Directories locked");

    let backup = panic::catch_unwind(AssertUnwindSafe(|| {
        backup_dashboard(&layout.dashboard, &layout.backup, now, journal)
    }));

    // Unlock before re-raising a panic.
    journal_lock_report(journal, &lock.unlock(), "Directories unlocked");
    let outcome = backup.unwrap_or_else(|payload| panic::resume_unwind(payload));
    if let Err(err) = &outcome {
        journal.error(&format!("Manual backup failed: {err}"));
    }
    outcome
}

/// Create the directory layout and apply the unlocked modes.
pub fn prepare(config: &DaemonConfig, journal: &dyn Journal) -> Result<Layout> {
    let layout = config.layout();

    for created in layout.ensure()? {
        journal.operation(&format!("Created directory {}", created.display()));
    }

    let mut lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, config.modes);
    // Not fatal: the cycle retries the modes on every unlock.
    journal_lock_report(journal, &lock.reset_modes(), "Directory permissions set");

    journal.operation("Daemon initialization complete");
    Ok(layout)
}

fn journal_lock_report(journal: &dyn Journal, report: &LockReport, done: &str) -> Vec<String> {
    if report.is_ok() {
        journal.operation(done);
        return Vec::new();
    }

    report
        .failures
        .iter()
        .map(|err: &Error| {
            let message = err.to_string();
            journal.error(&message);
            message
        })
        .collect()
}
