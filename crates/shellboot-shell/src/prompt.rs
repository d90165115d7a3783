use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use shellboot_core::{TimedOut, run_with_timeout};
use shellboot_platform::HideWindow;

use crate::fragment::CompiledPrompt;
use crate::shell::ShellKind;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt executable not found: {0}")]
    NotFound(String),

    #[error("Prompt config {location} is unreachable: {details}")]
    Unreachable { location: String, details: String },

    #[error("Failed to start prompt init: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Prompt init exited with {status}: {stderr}")]
    InitFailed { status: String, stderr: String },

    #[error("Prompt init output rejected: {reason}")]
    Rejected { reason: String },

    #[error(transparent)]
    TimedOut(#[from] TimedOut),

    #[error("Prompt init task failed: {0}")]
    Task(String),

    #[error("Failed to {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl PromptError {
    pub(crate) fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    fn unreachable(location: &ConfigLocation, details: impl Into<String>) -> Self {
        Self::Unreachable {
            location: location.to_string(),
            details: details.into(),
        }
    }
}

/// Where the prompt theme lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    Path(PathBuf),
    Url(String),
}

impl ConfigLocation {
    /// `None` for blank input. Anything with an `http(s)://` scheme is a URL.
    /// Paths get a leading `~` expanded to the home directory; relative paths
    /// are taken relative to `base`.
    #[must_use]
    pub fn parse(value: &str, base: &Path) -> Option<Self> {
        Self::resolve(value, dirs::home_dir().as_deref(), base)
    }

    fn resolve(value: &str, home: Option<&Path>, base: &Path) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        let lower = value.to_ascii_lowercase();
        if lower.starts_with("https://") || lower.starts_with("http://") {
            return Some(Self::Url(value.to_string()));
        }

        let path = match (value.strip_prefix('~'), home) {
            (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
                home.join(rest.trim_start_matches(['/', '\\']))
            }
            _ => PathBuf::from(value),
        };
        if path.is_relative() {
            Some(Self::Path(base.join(path)))
        } else {
            Some(Self::Path(path))
        }
    }
}

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub config: Option<ConfigLocation>,
    pub init_timeout: Duration,
    pub reachability_timeout: Duration,
}

#[async_trait]
pub trait PromptEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fail fast when the theme cannot be reached.
    async fn check_config(
        &self,
        location: &ConfigLocation,
        timeout: Duration,
    ) -> Result<(), PromptError>;

    /// Raw initialization code printed by the engine for `shell`.
    async fn init_script(
        &self,
        shell: ShellKind,
        config: Option<&ConfigLocation>,
    ) -> Result<String, PromptError>;
}

#[derive(Debug, Clone)]
pub struct OhMyPosh {
    executable: PathBuf,
    client: Option<reqwest::Client>,
}

impl OhMyPosh {
    /// Without a working HTTP client, URL themes are reported unreachable.
    #[must_use]
    pub fn new(executable: PathBuf) -> Self {
        let client = match reqwest::Client::builder()
            .user_agent(format!("shellboot/{}", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Failed to build HTTP client for prompt config checks: {e}");
                None
            }
        };
        Self { executable, client }
    }

    /// Resolve `executable` through `PATH`, keeping it as given when the
    /// lookup fails so the spawn reports the missing binary.
    #[must_use]
    pub fn locate(executable: &str) -> Self {
        let path = which::which(executable).unwrap_or_else(|_| PathBuf::from(executable));
        Self::new(path)
    }
}

#[async_trait]
impl PromptEngine for OhMyPosh {
    fn name(&self) -> &'static str {
        "oh-my-posh"
    }

    async fn check_config(
        &self,
        location: &ConfigLocation,
        timeout: Duration,
    ) -> Result<(), PromptError> {
        match location {
            ConfigLocation::Url(url) => {
                let Some(client) = &self.client else {
                    return Err(PromptError::unreachable(location, "no HTTP client available"));
                };
                let response = client
                    .head(url)
                    .timeout(timeout)
                    .send()
                    .await
                    .map_err(|error| PromptError::unreachable(location, error.to_string()))?;
                if !response.status().is_success() {
                    return Err(PromptError::unreachable(
                        location,
                        format!("HTTP {}", response.status()),
                    ));
                }
                Ok(())
            }
            ConfigLocation::Path(path) => match tokio::fs::try_exists(path).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(PromptError::unreachable(location, "file does not exist")),
                Err(error) => Err(PromptError::unreachable(location, error.to_string())),
            },
        }
    }

    async fn init_script(
        &self,
        shell: ShellKind,
        config: Option<&ConfigLocation>,
    ) -> Result<String, PromptError> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(["init", shell.init_name()]);
        if let Some(config) = config {
            cmd.arg("--config").arg(config.to_string());
        }
        cmd.arg("--print");
        cmd.hide_window();
        debug!("Running {} init for {shell}", self.executable.display());

        let output = cmd.output().await.map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                PromptError::NotFound(self.executable.display().to_string())
            } else {
                PromptError::Spawn(error)
            }
        })?;

        if !output.status.success() {
            return Err(PromptError::InitFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Produce the compiled prompt file for `shell` at `cache_path`.
///
/// The config is checked first, then the engine runs on its own task and is
/// awaited for at most `options.init_timeout`. A late task is left to finish
/// on its own and its output is ignored.
///
/// # Errors
/// Returns an error when the config is unreachable, initialization fails or
/// times out, or the output is rejected or cannot be written.
pub async fn initialize_prompt(
    engine: Arc<dyn PromptEngine>,
    shell: ShellKind,
    options: &PromptOptions,
    cache_path: &Path,
) -> Result<PathBuf, PromptError> {
    if let Some(location) = &options.config {
        run_with_timeout(
            options.reachability_timeout,
            "prompt config reachability check",
            engine.check_config(location, options.reachability_timeout),
            |error| error,
        )
        .await?;
    }

    let task = {
        let engine = Arc::clone(&engine);
        let config = options.config.clone();
        tokio::spawn(async move { engine.init_script(shell, config.as_ref()).await })
    };

    let text = run_with_timeout(options.init_timeout, "prompt init", task, |error| {
        PromptError::Task(error.to_string())
    })
    .await??;

    let compiled = CompiledPrompt::compile(shell, &text)?;
    compiled.write_to(cache_path)?;
    info!(
        "{} prompt for {shell} compiled to {}",
        engine.name(),
        cache_path.display()
    );
    Ok(cache_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::{
        ConfigLocation, OhMyPosh, PromptEngine, PromptError, PromptOptions, initialize_prompt,
    };
    use crate::shell::ShellKind;

    struct MockEngine {
        reachable: bool,
        check_delay: Duration,
        delay: Duration,
        output: &'static str,
        init_calls: AtomicUsize,
    }

    impl MockEngine {
        fn new(output: &'static str) -> Self {
            Self {
                reachable: true,
                check_delay: Duration::ZERO,
                delay: Duration::ZERO,
                output,
                init_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PromptEngine for MockEngine {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn check_config(
            &self,
            location: &ConfigLocation,
            _timeout: Duration,
        ) -> Result<(), PromptError> {
            tokio::time::sleep(self.check_delay).await;
            if self.reachable {
                Ok(())
            } else {
                Err(PromptError::Unreachable {
                    location: location.to_string(),
                    details: "connection refused".to_string(),
                })
            }
        }

        async fn init_script(
            &self,
            _shell: ShellKind,
            _config: Option<&ConfigLocation>,
        ) -> Result<String, PromptError> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.output.to_string())
        }
    }

    fn options(config: Option<&str>) -> PromptOptions {
        PromptOptions {
            config: config.and_then(|value| ConfigLocation::parse(value, Path::new("/"))),
            init_timeout: Duration::from_millis(200),
            reachability_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn config_location_distinguishes_urls_from_paths() {
        let base = Path::new("/");

        assert_eq!(
            ConfigLocation::parse(" HTTPS://example.com/theme.json ", base),
            Some(ConfigLocation::Url("HTTPS://example.com/theme.json".to_string()))
        );
        assert!(matches!(
            ConfigLocation::parse("themes/paradox.omp.json", base),
            Some(ConfigLocation::Path(_))
        ));
        assert_eq!(ConfigLocation::parse("   ", base), None);
    }

    #[test]
    fn home_and_relative_paths_are_resolved() {
        let home = tempfile::tempdir().expect("create home dir");
        let config_dir = tempfile::tempdir().expect("create config dir");

        assert_eq!(
            ConfigLocation::resolve("~/themes/paradox.omp.json", Some(home.path()), config_dir.path()),
            Some(ConfigLocation::Path(home.path().join("themes").join("paradox.omp.json")))
        );
        assert_eq!(
            ConfigLocation::resolve("paradox.omp.json", Some(home.path()), config_dir.path()),
            Some(ConfigLocation::Path(config_dir.path().join("paradox.omp.json")))
        );
        assert_eq!(
            ConfigLocation::resolve("~other/x.json", Some(home.path()), config_dir.path()),
            Some(ConfigLocation::Path(config_dir.path().join("~other/x.json")))
        );
    }

    #[tokio::test]
    async fn theme_under_home_is_reachable() {
        let home = tempfile::tempdir().expect("create home dir");
        let themes = home.path().join("themes");
        std::fs::create_dir_all(&themes).expect("create themes dir");
        std::fs::write(themes.join("paradox.omp.json"), "{}").expect("write theme");
        let location = ConfigLocation::resolve(
            "~/themes/paradox.omp.json",
            Some(home.path()),
            Path::new("/nonexistent"),
        )
        .expect("path should resolve");

        OhMyPosh::new(PathBuf::from("oh-my-posh"))
            .check_config(&location, Duration::from_secs(1))
            .await
            .expect("existing theme should be reachable");
    }

    #[tokio::test]
    async fn url_theme_without_http_client_is_unreachable() {
        let engine = OhMyPosh {
            executable: PathBuf::from("oh-my-posh"),
            client: None,
        };
        let location = ConfigLocation::Url("https://themes.example/paradox.omp.json".to_string());

        let result = engine.check_config(&location, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(PromptError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn writes_compiled_prompt_to_cache() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cache = temp_dir.path().join("prompt-init.sh");
        let engine = Arc::new(MockEngine::new("PS1='$ '\n"));

        let path = initialize_prompt(engine, ShellKind::Bash, &options(Some("https://x")), &cache)
            .await
            .expect("prompt should initialize");

        assert_eq!(path, cache);
        let written = std::fs::read_to_string(&cache).expect("read cache file");
        assert_eq!(written, "PS1='$ '\n");
    }

    #[tokio::test]
    async fn unreachable_config_skips_init() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cache = temp_dir.path().join("prompt-init.ps1");
        let engine = Arc::new(MockEngine {
            reachable: false,
            ..MockEngine::new("function prompt { '> ' }")
        });

        let result = initialize_prompt(
            engine.clone(),
            ShellKind::PowerShell,
            &options(Some("https://themes.invalid/x.json")),
            &cache,
        )
        .await;

        assert!(matches!(result, Err(PromptError::Unreachable { .. })));
        assert_eq!(engine.init_calls.load(Ordering::SeqCst), 0);
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn hanging_reachability_check_times_out_before_init() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cache = temp_dir.path().join("prompt-init.sh");
        let engine = Arc::new(MockEngine {
            check_delay: Duration::from_secs(5),
            ..MockEngine::new("PS1='$ '\n")
        });

        let started = std::time::Instant::now();
        let result = initialize_prompt(
            engine.clone(),
            ShellKind::Bash,
            &options(Some("https://themes.example/slow.omp.json")),
            &cache,
        )
        .await;

        assert!(matches!(result, Err(PromptError::TimedOut(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(engine.init_calls.load(Ordering::SeqCst), 0);
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn slow_init_times_out() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cache = temp_dir.path().join("prompt-init.fish");
        let engine = Arc::new(MockEngine {
            delay: Duration::from_secs(5),
            ..MockEngine::new("function fish_prompt; echo '> '; end")
        });

        let started = std::time::Instant::now();
        let result = initialize_prompt(engine, ShellKind::Fish, &options(None), &cache).await;

        assert!(matches!(result, Err(PromptError::TimedOut(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn rejected_output_is_not_written() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let cache = temp_dir.path().join("prompt-init.sh");
        let engine = Arc::new(MockEngine::new("PS1='unterminated"));

        let result = initialize_prompt(engine, ShellKind::Zsh, &options(None), &cache).await;

        assert!(matches!(result, Err(PromptError::Rejected { .. })));
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn missing_config_file_is_unreachable() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let location = ConfigLocation::Path(temp_dir.path().join("missing.omp.json"));

        let result = OhMyPosh::new(PathBuf::from("oh-my-posh"))
            .check_config(&location, Duration::from_secs(1))
            .await;

        assert!(matches!(result, Err(PromptError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn missing_executable_reports_not_found() {
        let engine = OhMyPosh::new(PathBuf::from("/nonexistent/shellboot/oh-my-posh"));

        let result = engine.init_script(ShellKind::Bash, None).await;

        assert!(matches!(result, Err(PromptError::NotFound(_))));
    }
}
