//! Single-shot checks of whether a file can be taken exclusively.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use fs2::FileExt;
use tracing::debug;

/// Outcome of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    Locked,
}

/// Something that can check a file once.
pub trait Probe: Send + Sync {
    fn probe(&self, path: &Path) -> ProbeOutcome;
}

/// Opens the file for read and write, without creating or truncating it, and
/// takes a non-blocking exclusive lock.
///
/// The handle is closed before returning, which also releases the lock. The
/// file's contents are never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExclusiveOpenProbe;

impl ExclusiveOpenProbe {
    fn try_exclusive(path: &Path) -> io::Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(false)
            .truncate(false)
            .open(path)?;
        FileExt::try_lock_exclusive(&file)
    }
}

impl Probe for ExclusiveOpenProbe {
    fn probe(&self, path: &Path) -> ProbeOutcome {
        match Self::try_exclusive(path) {
            Ok(()) => ProbeOutcome::Available,
            Err(e) => {
                // Any failure to get the handle counts as "in use".
                debug!(path = %path.display(), error = %e, "Exclusive open failed");
                ProbeOutcome::Locked
            }
        }
    }
}
