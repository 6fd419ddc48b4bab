use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default time between probes of a locked file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default for [`WaitOptions::max_wait`].
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Whether [`WaitOptions::max_wait`] ends the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// `max_wait` is accepted but ignored; the wait lasts until the file is
    /// free.
    #[default]
    Inert,
    /// Give up with [`crate::WaitError::Timeout`] once `max_wait` has passed.
    Enforced,
}

/// Shared flag for stopping a wait from another thread.
///
/// Checked once per probe, never during a sleep.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call settings for waiting on a file.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Return `false` right away instead of waiting when the file is locked.
    pub notify_only: bool,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub timeout: TimeoutPolicy,
    pub cancel: Option<CancelToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            notify_only: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            timeout: TimeoutPolicy::Inert,
            cancel: None,
        }
    }
}

impl WaitOptions {
    pub fn notify_only(mut self, notify_only: bool) -> Self {
        self.notify_only = notify_only;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Give up after `max_wait` instead of waiting forever.
    pub fn enforce_timeout(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self.timeout = TimeoutPolicy::Enforced;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
