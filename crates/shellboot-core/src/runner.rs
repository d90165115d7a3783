use log::{debug, info, warn};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use shellboot_backend::{ModuleRegistry, PackageManager, UpdateResult, UpdateTarget};

use crate::check::{check_module_updates, check_package_updates};

/// Everything the background check needs, owned by value so the task never
/// reaches back into the caller.
#[derive(Clone)]
pub struct CheckSnapshot {
    pub packages: Box<dyn PackageManager>,
    pub modules: Box<dyn ModuleRegistry>,
    pub package_targets: Vec<UpdateTarget>,
    pub module_targets: Vec<UpdateTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    pub packages: UpdateResult,
    pub modules: UpdateResult,
}

impl CheckOutcome {
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.packages.is_up_to_date() && self.modules.is_up_to_date()
    }
}

/// Outstanding background update check.
///
/// Consumed by [`AsyncCheckHandle::wait`] or [`AsyncCheckHandle::discard`],
/// so it is released exactly once. Releasing it never aborts the task; a
/// late result is dropped with the task.
#[must_use = "an update check handle should be awaited or discarded"]
pub struct AsyncCheckHandle {
    task: JoinHandle<CheckOutcome>,
    launched_at: Instant,
}

/// Start both checkers concurrently on the tokio runtime and return at once.
///
/// # Panics
/// Panics when called outside a tokio runtime.
pub fn launch(snapshot: CheckSnapshot) -> AsyncCheckHandle {
    debug!(
        "Launching update check: {} package target(s), {} module target(s)",
        snapshot.package_targets.len(),
        snapshot.module_targets.len()
    );

    let task = tokio::spawn(async move {
        let CheckSnapshot {
            packages,
            modules,
            package_targets,
            module_targets,
        } = snapshot;

        let (packages, modules) = tokio::join!(
            check_package_updates(packages.as_ref(), &package_targets),
            check_module_updates(modules.as_ref(), &module_targets),
        );

        CheckOutcome { packages, modules }
    });

    AsyncCheckHandle {
        task,
        launched_at: Instant::now(),
    }
}

impl AsyncCheckHandle {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait up to `timeout` for both results. `None` means the check was not
    /// ready in time (or failed); the handle is released either way.
    pub async fn wait(mut self, timeout: Duration) -> Option<CheckOutcome> {
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(outcome)) => {
                info!(
                    "Update check finished after {:?}",
                    self.launched_at.elapsed()
                );
                Some(outcome)
            }
            Ok(Err(e)) => {
                warn!("Update check task failed: {e}");
                None
            }
            Err(_) => {
                info!(
                    "Update check not ready after {timeout:?}, discarding its result"
                );
                None
            }
        }
    }

    /// Release the handle without waiting.
    pub fn discard(self) {
        debug!(
            "Discarding update check handle (finished: {})",
            self.task.is_finished()
        );
    }
}
