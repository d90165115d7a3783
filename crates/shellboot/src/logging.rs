use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const CRATE_PREFIX: &str = "shellboot";

/// Append-only log sink that reopens its file when it disappears, e.g. when
/// the user clears the log while a shell is starting.
struct ResilientFileWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl ResilientFileWriter {
    fn new(path: PathBuf) -> io::Result<Self> {
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut slot = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if slot.is_none() || !self.path.exists() {
            *slot = Some(open_append(&self.path)?);
        }
        match slot.as_mut() {
            Some(file) => op(file),
            None => Err(io::Error::other("log file not available")),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for ResilientFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(File::flush)
    }
}

/// Keep only the newest `retain` lines once the file exceeds `max_lines`.
fn trim_log_file(log_path: &Path, max_lines: usize, retain: usize) {
    let Ok(contents) = std::fs::read_to_string(log_path) else {
        return;
    };

    let lines: Vec<&str> = contents.lines().collect();
    if lines.len() <= max_lines {
        return;
    }

    let keep = retain.min(lines.len());
    let mut trimmed = lines[lines.len() - keep..].join("\n");
    if !trimmed.is_empty() {
        trimmed.push('\n');
    }
    let _ = std::fs::write(log_path, trimmed);
}

/// Log everything at `debug` level and above to `log_path`; the terminal
/// only shows warnings unless `debug_enabled`.
pub fn init_logging(log_path: &Path, debug_enabled: bool, max_lines: usize, retain: usize) {
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    trim_log_file(log_path, max_lines, retain);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str(CRATE_PREFIX)
        .build();

    let term_level = if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Ok(writer) = ResilientFileWriter::new(log_path.to_path_buf()) {
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer));
    }

    let _ = CombinedLogger::init(loggers);

    log::debug!("Logging initialized, log file: {}", log_path.display());
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{ResilientFileWriter, trim_log_file};

    #[test]
    fn writer_reopens_log_cleared_by_user() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log_path = dir.path().join("logs").join("shellboot.log");
        let mut writer = ResilientFileWriter::new(log_path.clone()).expect("open log");

        writeln!(writer, "[INFO] before").expect("write before removal");
        std::fs::remove_file(&log_path).expect("remove log");
        writeln!(writer, "[WARN] after").expect("write after removal");
        writer.flush().expect("flush");

        assert_eq!(
            std::fs::read_to_string(&log_path).expect("read log"),
            "[WARN] after\n"
        );
    }

    #[test]
    fn trim_keeps_most_recent_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log_path = dir.path().join("shellboot.log");
        let original: String = (1..=12).map(|n| format!("line-{n}\n")).collect();
        std::fs::write(&log_path, original).expect("seed log");

        trim_log_file(&log_path, 10, 9);

        let trimmed = std::fs::read_to_string(&log_path).expect("read trimmed log");
        assert_eq!(trimmed.lines().count(), 9);
        assert!(trimmed.starts_with("line-4\n"));
        assert!(trimmed.ends_with("line-12\n"));
    }

    #[test]
    fn trim_leaves_short_file_untouched() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log_path = dir.path().join("shellboot.log");
        std::fs::write(&log_path, "a\nb\n").expect("seed log");

        trim_log_file(&log_path, 10, 9);

        let contents = std::fs::read_to_string(&log_path).expect("read log");
        assert_eq!(contents, "a\nb\n");
    }

    #[test]
    fn trim_ignores_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log_path = dir.path().join("missing.log");

        trim_log_file(&log_path, 10, 9);

        assert!(!log_path.exists());
    }
}
