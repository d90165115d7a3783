use chrono::{Local, NaiveDate};
use fs2::FileExt;
use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MARKER_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum GateError {
    #[error("{context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("marker does not contain a YYYY-MM-DD date: {content:?}")]
    Malformed { content: String },
}

/// Daily throttle for the update check.
///
/// The marker file holds the date of the last run. The first call on a fresh
/// machine seeds it with yesterday, so that call never skips.
#[derive(Debug, Clone)]
pub struct LastRunGate {
    marker: PathBuf,
}

impl LastRunGate {
    #[must_use]
    pub fn new(marker: PathBuf) -> Self {
        Self { marker }
    }

    #[must_use]
    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    /// Decide against the process's local calendar date.
    #[must_use]
    pub fn should_skip_today(&self) -> bool {
        self.should_skip(Local::now().date_naive())
    }

    /// Returns `true` when a check already ran on `today`. Otherwise records
    /// `today` and returns `false`. Persistence failures fail open.
    #[must_use]
    pub fn should_skip(&self, today: NaiveDate) -> bool {
        match self.evaluate(today) {
            Ok(skip) => skip,
            Err(e) => {
                warn!("Last-run gate failed, running the update check anyway: {e}");
                false
            }
        }
    }

    /// Date recorded by the last run, if the marker exists and is readable.
    #[must_use]
    pub fn last_run(&self) -> Option<NaiveDate> {
        let content = std::fs::read_to_string(&self.marker).ok()?;
        parse_marker(&content).ok()
    }

    /// Remove the marker so the next evaluation runs the check.
    ///
    /// # Errors
    /// Returns an error if the marker exists but cannot be removed.
    pub fn reset(&self) -> Result<(), GateError> {
        match std::fs::remove_file(&self.marker) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove marker", e)),
        }
    }

    fn evaluate(&self, today: NaiveDate) -> Result<bool, GateError> {
        if let Some(parent) = self.marker.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| self.io_error("create marker directory", e))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.marker)
            .map_err(|e| self.io_error("open marker", e))?;

        // Held until `file` drops; two shells started together must not both
        // see a stale date.
        file.lock_exclusive()
            .map_err(|e| self.io_error("lock marker", e))?;

        // Decided under the lock: a shell that lost the race sees the date
        // the winner wrote, not an empty file.
        let empty = file
            .metadata()
            .map_err(|e| self.io_error("inspect marker", e))?
            .len()
            == 0;

        let last_run = if empty {
            let yesterday = today.pred_opt().unwrap_or(NaiveDate::MIN);
            info!("Initializing last-run marker at {}", self.marker.display());
            self.write_marker(&mut file, yesterday)?;
            Some(yesterday)
        } else {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .map_err(|e| self.io_error("read marker", e))?;
            match parse_marker(&String::from_utf8_lossy(&bytes)) {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!("Ignoring unreadable last-run marker: {e}");
                    None
                }
            }
        };

        if last_run == Some(today) {
            debug!("Update check already ran on {today}, skipping");
            return Ok(true);
        }

        self.write_marker(&mut file, today)?;
        debug!("Recorded {today} as the last update check");
        Ok(false)
    }

    fn write_marker(&self, file: &mut File, date: NaiveDate) -> Result<(), GateError> {
        overwrite_date(file, date).map_err(|e| self.io_error("write marker", e))
    }

    fn io_error(&self, context: &'static str, source: std::io::Error) -> GateError {
        GateError::Io {
            context,
            path: self.marker.clone(),
            source,
        }
    }
}

fn overwrite_date(file: &mut File, date: NaiveDate) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", date.format(MARKER_FORMAT))?;
    file.flush()
}

fn parse_marker(content: &str) -> Result<NaiveDate, GateError> {
    NaiveDate::parse_from_str(content.trim(), MARKER_FORMAT).map_err(|_| GateError::Malformed {
        content: content.trim().to_string(),
    })
}
