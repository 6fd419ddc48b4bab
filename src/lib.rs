//! Small standalone helpers.
//!
//! - [`loader`] runs a Rhai script file by path and hands back its top-level
//!   bindings, resolving the script's sibling imports along the way.
//! - [`availability`] polls a file until no other handle holds it exclusively.
//!
//! The two halves share nothing; each function is meant to be called directly.

pub mod availability;
pub mod config;
pub mod error;
pub mod loader;
pub mod notify;

pub use availability::{
    wait_for_file_availability, CancelToken, FileWaiter, TimeoutPolicy, WaitOptions,
};
pub use error::{ImportError, WaitError};
pub use loader::{import_from_file, Binding, Callable, ExecutedUnit, Loaded, ModuleLoader};
pub use notify::{ConsoleNotifier, Notifier, SilentNotifier};
