//! Optional settings file.
//!
//! Nothing in the crate needs a config file; every call takes its parameters
//! directly. Callers that want persistent defaults can keep them in
//! `<config_dir>/simple-func/config.toml`:
//!
//! ```toml
//! [wait]
//! notify_only = false
//! poll_interval_secs = 3
//! max_wait_secs = 600
//! enforce_timeout = false
//! desktop_notifications = false
//!
//! [loader]
//! search_paths = ["/opt/scripts/lib"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::availability::{FileWaiter, TimeoutPolicy, WaitOptions};
use crate::loader::search_path;
use crate::notify::ConsoleNotifier;

/// Parsed config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub wait: WaitSettings,
    pub loader: LoaderSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub notify_only: bool,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub enforce_timeout: bool,
    pub desktop_notifications: bool,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            notify_only: false,
            poll_interval_secs: 3,
            max_wait_secs: 600,
            enforce_timeout: false,
            desktop_notifications: false,
        }
    }
}

impl WaitSettings {
    pub fn to_options(&self) -> WaitOptions {
        WaitOptions {
            notify_only: self.notify_only,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
            timeout: if self.enforce_timeout {
                TimeoutPolicy::Enforced
            } else {
                TimeoutPolicy::Inert
            },
            cancel: None,
        }
    }

    /// Console waiter configured from these settings.
    pub fn waiter(&self) -> FileWaiter {
        let notifier =
            ConsoleNotifier::new().with_desktop_notifications(self.desktop_notifications);
        FileWaiter::with_notifier(self.to_options(), notifier)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Extra directories for script imports, appended to the global search
    /// path.
    pub search_paths: Vec<PathBuf>,
}

impl LoaderSettings {
    /// Append the configured directories to the search path.
    ///
    /// Returns how many were newly added.
    pub fn apply(&self) -> usize {
        self.search_paths
            .iter()
            .filter(|dir| search_path::push(dir.as_path()))
            .count()
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    /// Load and parse a settings file
    ///
    /// # Returns
    /// * `Ok(Some(Settings))` - File loaded and parsed successfully
    /// * `Ok(None)` - File doesn't exist
    /// * `Err(_)` - Failed to read or parse the file
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).map(Some)
    }

    /// Load settings from the per-user config directory
    pub fn load_default() -> Result<Option<Self>> {
        match default_path() {
            Some(path) => Self::load(&path),
            None => Ok(None),
        }
    }
}

/// `<config_dir>/simple-func/config.toml`, if the platform has a config dir
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("simple-func").join("config.toml"))
}
