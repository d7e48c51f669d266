//! Integration tests for the directory lock controller

use crate::fixtures::TEST_LOCKED_MODE;
use reportd::services::lock::{DirectoryLock, LockState, current_mode, set_directory_mode};
use reportd::{Error, Layout, LockModes};
use tempfile::TempDir;

fn test_modes() -> LockModes {
    LockModes {
        locked: TEST_LOCKED_MODE,
        ..LockModes::default()
    }
}

fn layout_in(temp_dir: &TempDir) -> Layout {
    let layout = Layout::new(temp_dir.path());
    layout.ensure().unwrap();
    layout
}

#[test]
fn lock_applies_locked_mode_to_both_directories() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    let mut lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, test_modes());

    let report = lock.lock();

    assert!(report.is_ok());
    assert_eq!(report.attempted, 2);
    assert_eq!(lock.state(), LockState::Locked);
    assert_eq!(current_mode(&layout.inbox).unwrap(), TEST_LOCKED_MODE);
    assert_eq!(current_mode(&layout.dashboard).unwrap(), TEST_LOCKED_MODE);

    assert!(lock.unlock().is_ok());
}

#[test]
fn unlock_restores_previous_bits() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    set_directory_mode(&layout.inbox, 0o751).unwrap();
    set_directory_mode(&layout.dashboard, 0o750).unwrap();

    let mut lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, test_modes());
    lock.lock();
    let report = lock.unlock();

    assert!(report.is_ok());
    assert_eq!(lock.state(), LockState::Unlocked);
    assert_eq!(current_mode(&layout.inbox).unwrap(), 0o751);
    assert_eq!(current_mode(&layout.dashboard).unwrap(), 0o750);
}

#[test]
fn relocking_keeps_first_observed_mode() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    set_directory_mode(&layout.inbox, 0o775).unwrap();

    let mut lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, test_modes());
    lock.lock();
    lock.lock();
    lock.unlock();

    assert_eq!(current_mode(&layout.inbox).unwrap(), 0o775);
}

#[test]
fn unlock_without_lock_applies_configured_modes() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    let mut lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, test_modes());

    assert!(lock.unlock().is_ok());
    assert_eq!(current_mode(&layout.inbox).unwrap(), 0o777);
    assert_eq!(current_mode(&layout.dashboard).unwrap(), 0o755);
}

#[test]
fn reset_modes_forgets_recorded_bits() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    set_directory_mode(&layout.inbox, 0o700).unwrap();

    let mut lock = DirectoryLock::new(&layout.inbox, &layout.dashboard, test_modes());
    lock.lock();
    assert!(lock.reset_modes().is_ok());

    assert_eq!(current_mode(&layout.inbox).unwrap(), 0o777);
    assert_eq!(current_mode(&layout.dashboard).unwrap(), 0o755);
}

#[test]
fn failure_on_one_directory_does_not_stop_the_other() {
    let temp_dir = TempDir::new().unwrap();
    let layout = layout_in(&temp_dir);
    let absent = temp_dir.path().join("absent");
    set_directory_mode(&layout.dashboard, 0o755).unwrap();
    let mut lock = DirectoryLock::new(&absent, &layout.dashboard, test_modes());

    let locked = lock.lock();
    assert_eq!(locked.failures.len(), 1);
    assert!(matches!(locked.failures[0], Error::LockFailed { .. }));
    assert_eq!(current_mode(&layout.dashboard).unwrap(), TEST_LOCKED_MODE);

    let unlocked = lock.unlock();
    assert_eq!(unlocked.failures.len(), 1);
    assert!(matches!(unlocked.failures[0], Error::UnlockFailed { .. }));
    assert_eq!(current_mode(&layout.dashboard).unwrap(), 0o755);
    assert_eq!(lock.state(), LockState::Locked);
}

#[test]
fn lock_that_changes_nothing_stays_unlocked() {
    let temp_dir = TempDir::new().unwrap();
    let mut lock = DirectoryLock::new(
        &temp_dir.path().join("no-inbox"),
        &temp_dir.path().join("no-dashboard"),
        test_modes(),
    );

    let report = lock.lock();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(lock.state(), LockState::Unlocked);
}
