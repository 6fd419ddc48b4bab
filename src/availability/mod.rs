//! Wait until a file can be opened exclusively for reading and writing.
//!
//! Meant to guard against editing a file that another program (a
//! spreadsheet, an editor) still holds open. A locked file is probed every
//! [`WaitOptions::poll_interval`]; the user is alerted once, on the first
//! failed probe, and told again once the file frees up.

mod options;
mod probe;

pub use options::{
    CancelToken, TimeoutPolicy, WaitOptions, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL,
};
pub use probe::{ExclusiveOpenProbe, Probe, ProbeOutcome};

use std::path::Path;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::WaitError;
use crate::notify::{ConsoleNotifier, Notifier};

/// Polls one file at a time. Holds no state between calls.
pub struct FileWaiter {
    options: WaitOptions,
    notifier: Box<dyn Notifier>,
    probe: Box<dyn Probe>,
}

impl FileWaiter {
    /// Waiter that reports to the terminal.
    pub fn new(options: WaitOptions) -> Self {
        Self::with_notifier(options, ConsoleNotifier::new())
    }

    pub fn with_notifier(options: WaitOptions, notifier: impl Notifier + 'static) -> Self {
        Self {
            options,
            notifier: Box::new(notifier),
            probe: Box::new(ExclusiveOpenProbe),
        }
    }

    /// Swap the exclusive-open check for another probe.
    pub fn with_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// One probe, no waiting and no notifications.
    pub fn is_available(&self, path: impl AsRef<Path>) -> bool {
        self.probe.probe(path.as_ref()) == ProbeOutcome::Available
    }

    /// Block until `path` can be opened exclusively.
    ///
    /// Returns `Ok(true)` once the file is free, and also for a file that
    /// does not exist. Returns `Ok(false)` only in notify-only mode when the
    /// file is locked.
    pub fn wait(&self, path: impl AsRef<Path>) -> Result<bool, WaitError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "File does not exist, treating as available");
            self.notifier.file_missing(path);
            return Ok(true);
        }

        let started = Instant::now();
        let mut alerted = false;

        loop {
            if self.options.is_cancelled() {
                return Err(WaitError::Cancelled {
                    path: path.to_path_buf(),
                });
            }

            match self.probe.probe(path) {
                ProbeOutcome::Available => {
                    if alerted {
                        info!(path = %path.display(), "File is now available");
                        self.notifier.file_available(path);
                    }
                    return Ok(true);
                }
                ProbeOutcome::Locked => {
                    if self.options.notify_only {
                        debug!(path = %path.display(), "File locked, not waiting");
                        return Ok(false);
                    }

                    if !alerted {
                        warn!(path = %path.display(), "File is in use, waiting for it to close");
                        self.notifier.file_locked(path);
                        alerted = true;
                    }
                }
            }

            let mut pause = self.options.poll_interval;
            if self.options.timeout == TimeoutPolicy::Enforced {
                let elapsed = started.elapsed();
                if elapsed >= self.options.max_wait {
                    return Err(WaitError::Timeout {
                        path: path.to_path_buf(),
                        waited: self.options.max_wait,
                    });
                }
                // Never sleep past the deadline.
                pause = pause.min(self.options.max_wait - elapsed);
            }

            thread::sleep(pause);
        }
    }
}

/// Wait for `file_path` using the terminal notifier.
pub fn wait_for_file_availability(
    file_path: impl AsRef<Path>,
    options: &WaitOptions,
) -> Result<bool, WaitError> {
    FileWaiter::new(options.clone()).wait(file_path)
}
