//! Update-check core for shellboot.
//!
//! This crate is independent of any concrete package manager, registry or
//! shell:
//! - The daily last-run gate persisted as a date marker.
//! - The package and module update checkers.
//! - The background runner that executes both checkers under a bounded wait.
//! - A small timeout helper shared by the other bounded waits.

mod check;
mod gate;
mod runner;
mod timeout;

/// Generic checker plus the package-manager and module-registry variants.
pub use check::{VersionProbe, check_module_updates, check_package_updates, check_updates};
/// Daily throttle backed by a date marker file.
pub use gate::{GateError, LastRunGate};
/// Background execution of both checkers with a bounded wait.
pub use runner::{AsyncCheckHandle, CheckOutcome, CheckSnapshot, launch};
/// Timeout wrapper mapping elapsed deadlines into the caller's error type.
pub use timeout::{TimedOut, run_with_timeout};

pub use shellboot_backend::{UpdateNotice, UpdateResult, UpdateTarget};
