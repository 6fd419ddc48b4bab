//! Module search path.
//!
//! An ordered list of directories that `import` statements in loaded scripts
//! are resolved against, first match wins. Two layers make up the path a
//! load sees:
//!
//! - directories of the loads in progress on the current thread, innermost
//!   first, added by [`SearchPathGuard`] and removed again on drop;
//! - the process-wide list managed by [`push`] and [`remove`].
//!
//! Loads never touch the process-wide list, so concurrent loads on other
//! threads don't see each other's directories, and a script may load another
//! script from a host function without blocking.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

static SEARCH_PATH: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

thread_local! {
    static LOAD_DIRS: RefCell<Vec<PathBuf>> = const { RefCell::new(Vec::new()) };
}

fn lock() -> MutexGuard<'static, Vec<PathBuf>> {
    // Every critical section is a single push, remove or clone.
    SEARCH_PATH.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Copy of the process-wide search path.
pub fn snapshot() -> Vec<PathBuf> {
    lock().clone()
}

/// The search path a load started now on this thread would use.
pub fn effective() -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> =
        LOAD_DIRS.with(|dirs| dirs.borrow().iter().rev().cloned().collect());
    for dir in snapshot() {
        if !entries.contains(&dir) {
            entries.push(dir);
        }
    }
    entries
}

/// Append a directory to the process-wide search path.
///
/// Returns `false` if it was already present.
pub fn push(dir: impl Into<PathBuf>) -> bool {
    let dir = dir.into();
    let mut entries = lock();
    if entries.contains(&dir) {
        return false;
    }
    debug!(dir = %dir.display(), "Appending search path entry");
    entries.push(dir);
    true
}

/// Remove a directory from the process-wide search path.
///
/// Returns `false` if it was not present.
pub fn remove(dir: &Path) -> bool {
    let mut entries = lock();
    match entries.iter().position(|entry| entry == dir) {
        Some(index) => {
            debug!(dir = %dir.display(), "Removing search path entry");
            entries.remove(index);
            true
        }
        None => false,
    }
}

/// Puts the loaded file's directory at the front of this thread's search
/// path for the duration of one load.
///
/// Dropping the guard removes the directory again, but only if this guard was
/// the one that added it. Guards nest: a load started while another is in
/// progress sees both directories, its own first.
pub struct SearchPathGuard {
    inserted: Option<PathBuf>,
    entries: Vec<PathBuf>,
}

impl SearchPathGuard {
    pub fn acquire(dir: &Path) -> Self {
        let inserted = if effective().iter().any(|entry| entry == dir) {
            debug!(dir = %dir.display(), "Search path already contains directory");
            None
        } else {
            debug!(dir = %dir.display(), "Prepending search path entry for load");
            LOAD_DIRS.with(|dirs| dirs.borrow_mut().push(dir.to_path_buf()));
            Some(dir.to_path_buf())
        };

        Self {
            inserted,
            entries: effective(),
        }
    }

    /// The search path as seen by the load in progress.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

impl Drop for SearchPathGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.inserted.take() {
            LOAD_DIRS.with(|dirs| {
                let mut dirs = dirs.borrow_mut();
                if let Some(index) = dirs.iter().rposition(|entry| *entry == dir) {
                    dirs.remove(index);
                    debug!(dir = %dir.display(), "Removed search path entry after load");
                }
            });
        }
    }
}
