use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "shellboot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Could not determine the user's {0} directory")]
pub struct AppPathsError(pub &'static str);

/// Per-user locations. Every directory is already scoped to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Resolve the platform's config, cache and data directories. macOS keeps
    /// config under `~/.config` like the other shells' dotfiles.
    ///
    /// # Errors
    /// Returns an error naming the base directory that could not be found.
    pub fn new() -> Result<Self, AppPathsError> {
        #[cfg(target_os = "macos")]
        let (config, cache, data) = {
            let home = dirs::home_dir().ok_or(AppPathsError("home"))?;
            (
                home.join(".config"),
                home.join("Library").join("Caches"),
                home.join("Library").join("Application Support"),
            )
        };

        #[cfg(not(target_os = "macos"))]
        let (config, cache, data) = (
            dirs::config_dir().ok_or(AppPathsError("config"))?,
            dirs::cache_dir().ok_or(AppPathsError("cache"))?,
            dirs::data_dir().ok_or(AppPathsError("data"))?,
        );

        Ok(Self {
            config_dir: config.join(APP_DIR),
            cache_dir: cache.join(APP_DIR),
            data_dir: data.join(APP_DIR),
        })
    }

    /// Lay every location out under a single root.
    #[must_use]
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        }
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// One `YYYY-MM-DD` line: the date of the last update check.
    #[must_use]
    pub fn marker_file(&self) -> PathBuf {
        self.config_dir.join("last_update_check")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("shellboot.log")
    }

    #[must_use]
    pub fn prompt_cache_file(&self, extension: &str) -> PathBuf {
        self.cache_dir.join(format!("prompt-init.{extension}"))
    }

    #[must_use]
    pub fn activation_file(&self, extension: &str) -> PathBuf {
        self.data_dir.join(format!("activate.{extension}"))
    }

    /// # Errors
    /// Returns the first directory creation failure.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        [&self.config_dir, &self.cache_dir, &self.data_dir]
            .into_iter()
            .try_for_each(std::fs::create_dir_all)
    }
}
