//! User-facing signals for file waits.
//!
//! The console notifier prints colored messages and rings the terminal bell.
//! It can also raise a desktop notification, using notify-send on Linux and
//! osascript on macOS.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use colored::Colorize;
use tracing::warn;

/// Receives the user-visible events of a file wait.
pub trait Notifier: Send + Sync {
    /// The file does not exist; the wait reports it as available anyway.
    fn file_missing(&self, path: &Path);

    /// First failed probe of a wait. Called at most once per wait.
    fn file_locked(&self, path: &Path);

    /// The file became free after at least one failed probe.
    fn file_available(&self, path: &Path);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn file_missing(&self, _path: &Path) {}
    fn file_locked(&self, _path: &Path) {}
    fn file_available(&self, _path: &Path) {}
}

/// Prints to the terminal and beeps when a file is locked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    desktop: bool,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also raise a desktop notification when a file is locked.
    pub fn with_desktop_notifications(mut self, enabled: bool) -> Self {
        self.desktop = enabled;
        self
    }

    /// Best effort: a missing notifier binary is logged, not reported.
    fn alert_desktop(&self, path: &Path) {
        let mut command = locked_file_alert(path);
        let program = command.get_program().to_string_lossy().to_string();

        match command.output() {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                warn!(%program, status = %output.status, "Desktop notification failed")
            }
            Err(e) => warn!(%program, error = %e, "Desktop notification failed"),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn file_missing(&self, path: &Path) {
        eprintln!(
            "{} The file '{}' does not exist.",
            "Error:".red().bold(),
            path.display()
        );
    }

    fn file_locked(&self, path: &Path) {
        beep();
        println!(
            "{} The file '{}' is currently in use. Please close it to proceed.",
            "Warning:".yellow().bold(),
            path.display()
        );

        if self.desktop {
            self.alert_desktop(path);
        }
    }

    fn file_available(&self, path: &Path) {
        println!(
            "{} The file '{}' is now available.",
            "✓".green().bold(),
            path.display()
        );
    }
}

/// Ring the terminal bell.
fn beep() {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();
}

const ALERT_TITLE: &str = "File in use";

/// notify-send on Linux, osascript on macOS.
fn locked_file_alert(path: &Path) -> Command {
    let body = format!("Close '{}' to continue.", path.display());

    if cfg!(target_os = "macos") {
        let mut command = Command::new("osascript");
        command.arg("-e").arg(format!(
            r#"display notification "{}" with title "{}""#,
            quote_applescript(&body),
            ALERT_TITLE
        ));
        command
    } else {
        let mut command = Command::new("notify-send");
        command
            .arg("--urgency=critical")
            .arg("--app-name=simple-func")
            .arg(ALERT_TITLE)
            .arg(body);
        command
    }
}

fn quote_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
