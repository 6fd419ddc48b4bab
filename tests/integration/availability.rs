//! Waiting on files held by another handle.

use fs2::FileExt;
use simple_func::{FileWaiter, Notifier, WaitOptions};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<&'static str>>>);

impl Recorder {
    fn events(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn file_missing(&self, _path: &Path) {
        self.0.lock().unwrap().push("missing");
    }
    fn file_locked(&self, _path: &Path) {
        self.0.lock().unwrap().push("locked");
    }
    fn file_available(&self, _path: &Path) {
        self.0.lock().unwrap().push("available");
    }
}

fn spreadsheet(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("report.xlsx");
    fs::write(&path, "quarterly numbers").unwrap();
    path
}

fn hold_exclusive(path: &Path) -> File {
    let holder = File::open(path).unwrap();
    FileExt::lock_exclusive(&holder).unwrap();
    holder
}

#[test]
fn test_unlocked_file_available_on_first_probe() {
    let temp_dir = TempDir::new().unwrap();
    let path = spreadsheet(&temp_dir);
    let recorder = Recorder::default();
    let waiter = FileWaiter::with_notifier(WaitOptions::default(), recorder.clone());

    let started = Instant::now();
    assert!(waiter.wait(&path).unwrap());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(recorder.events().is_empty());
}

#[test]
fn test_locked_file_notify_only_returns_false() {
    let temp_dir = TempDir::new().unwrap();
    let path = spreadsheet(&temp_dir);
    let _holder = hold_exclusive(&path);
    let recorder = Recorder::default();
    let waiter =
        FileWaiter::with_notifier(WaitOptions::default().notify_only(true), recorder.clone());

    let started = Instant::now();
    assert!(!waiter.wait(&path).unwrap());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(recorder.events().is_empty());
}

#[test]
fn test_waits_until_other_handle_releases() {
    let temp_dir = TempDir::new().unwrap();
    let path = spreadsheet(&temp_dir);
    let holder = hold_exclusive(&path);
    let interval = Duration::from_millis(50);

    let release = thread::spawn(move || {
        thread::sleep(interval * 2 + interval / 2);
        drop(holder);
    });

    let recorder = Recorder::default();
    let waiter = FileWaiter::with_notifier(
        WaitOptions::default().poll_interval(interval),
        recorder.clone(),
    );

    assert!(waiter.wait(&path).unwrap());
    release.join().unwrap();

    assert_eq!(recorder.events(), vec!["locked", "available"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), "quarterly numbers");
}

#[test]
fn test_enforced_timeout_on_held_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = spreadsheet(&temp_dir);
    let _holder = hold_exclusive(&path);
    let recorder = Recorder::default();
    let options = WaitOptions::default()
        .poll_interval(Duration::from_millis(20))
        .enforce_timeout(Duration::from_millis(100));
    let waiter = FileWaiter::with_notifier(options, recorder.clone());

    let err = waiter.wait(&path).unwrap_err();

    assert!(matches!(err, simple_func::WaitError::Timeout { .. }));
    assert_eq!(recorder.events(), vec!["locked"]);
}

#[test]
fn test_is_available_single_probe() {
    let temp_dir = TempDir::new().unwrap();
    let path = spreadsheet(&temp_dir);
    let waiter = FileWaiter::with_notifier(WaitOptions::default(), Recorder::default());

    assert!(waiter.is_available(&path));
    let holder = hold_exclusive(&path);
    assert!(!waiter.is_available(&path));
    drop(holder);
    assert!(waiter.is_available(&path));
}
