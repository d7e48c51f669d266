//! Unit tests for the side channel

use reportd::OutcomeStatus;
use reportd::services::notify::{EventKind, NotifyEvent, event_channel, spawn_worker};

#[test]
fn dequeue_on_empty_queue_returns_none() {
    let (_sender, queue) = event_channel();
    assert!(queue.try_dequeue().is_none());
}

#[test]
fn events_arrive_in_send_order() {
    let (sender, queue) = event_channel();
    assert!(sender.enqueue(NotifyEvent::new(EventKind::TransferStart, "scheduler", 0, "a")));
    assert!(sender.enqueue(NotifyEvent::new(EventKind::TransferComplete, "scheduler", 0, "b")));

    let kinds: Vec<EventKind> = queue.drain().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::TransferStart, EventKind::TransferComplete]);
}

#[test]
fn enqueue_without_receiver_reports_false() {
    let (sender, queue) = event_channel();
    drop(queue);
    assert!(!sender.enqueue(NotifyEvent::new(EventKind::Error, "test", -1, "lost")));
}

#[test]
fn worker_sends_exactly_one_completion() {
    let (sender, queue) = event_channel();

    let handle = spawn_worker("test-worker", EventKind::BackupComplete, sender, || {
        OutcomeStatus::Partial
    })
    .unwrap();
    handle.join().unwrap();

    let events = queue.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::BackupComplete);
    assert_eq!(events[0].origin, "test-worker");
    assert_eq!(events[0].status, 1);
    assert!(queue.try_dequeue().is_none());
}

#[test]
fn panicking_worker_still_reports_failure() {
    let (sender, queue) = event_channel();

    let handle = spawn_worker("test-worker", EventKind::BackupComplete, sender, || {
        panic!("backup exploded")
    })
    .unwrap();
    handle.join().unwrap();

    let events = queue.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::BackupComplete);
    assert_eq!(events[0].status, OutcomeStatus::Failure.code());
    assert_eq!(events[0].message, "Operation failed");
}

#[test]
fn event_display_names_kind_and_origin() {
    let event = NotifyEvent::new(EventKind::BackupComplete, "manual-backup", -1, "Operation failed");
    assert_eq!(
        event.to_string(),
        "backup-complete from manual-backup (status -1): Operation failed"
    );
}
