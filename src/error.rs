//! Error types for script loading and file waiting.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure while loading a script file or reading something out of it.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Could not create a module from {}: unsupported extension (expected .{expected})", path.display())]
    UnsupportedExtension { path: PathBuf, expected: &'static str },

    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compile {}", path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: rhai::ParseError,
    },

    #[error("Executing {} raised an error", path.display())]
    Execution {
        path: PathBuf,
        #[source]
        source: Box<rhai::EvalAltResult>,
    },

    #[error("Module '{unit}' has no attribute '{attribute}'")]
    AttributeNotFound { unit: String, attribute: String },

    #[error("Calling '{unit}::{function}' failed")]
    Call {
        unit: String,
        function: String,
        #[source]
        source: Box<rhai::EvalAltResult>,
    },
}

impl ImportError {
    /// True for failures that happen while building or executing the unit,
    /// as opposed to a missing file or a missing attribute.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedExtension { .. }
                | Self::Io { .. }
                | Self::Compile { .. }
                | Self::Execution { .. }
        )
    }
}

/// Failure while waiting for a file to become available.
///
/// Lock contention itself is never an error; it only drives the retry loop.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("The file '{}' is still in use after {} seconds", path.display(), waited.as_secs())]
    Timeout { path: PathBuf, waited: Duration },

    #[error("Waiting for '{}' was cancelled", path.display())]
    Cancelled { path: PathBuf },
}
