use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use shellboot_core::UpdateTarget;
use shellboot_shell::{ConfigLocation, LineEditing, PromptOptions};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsIssue {
    #[error("Failed to read settings file {path}: {details}")]
    Read { path: PathBuf, details: String },

    #[error("Settings file is not a JSON object, using defaults: {details}")]
    Syntax { details: String },

    #[error("Settings section `{section}` is malformed, using its defaults: {details}")]
    Section {
        section: &'static str,
        details: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptSettings {
    #[serde(default = "default_prompt_executable")]
    pub executable: String,

    #[serde(default)]
    pub config: Option<String>,

    #[serde(default = "default_prompt_init_timeout")]
    pub init_timeout_secs: u64,

    #[serde(default = "default_reachability_timeout")]
    pub reachability_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            executable: default_prompt_executable(),
            config: None,
            init_timeout_secs: default_prompt_init_timeout(),
            reachability_timeout_secs: default_reachability_timeout(),
            enabled: true,
        }
    }
}

impl PromptSettings {
    /// Relative theme paths are resolved against `config_dir`.
    pub fn options(&self, config_dir: &Path) -> PromptOptions {
        PromptOptions {
            config: self
                .config
                .as_deref()
                .and_then(|value| ConfigLocation::parse(value, config_dir)),
            init_timeout: Duration::from_secs(self.init_timeout_secs),
            reachability_timeout: Duration::from_secs(self.reachability_timeout_secs),
        }
    }
}

/// Immutable configuration for one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub packages: Vec<UpdateTarget>,
    pub modules: Vec<UpdateTarget>,
    pub environment: BTreeMap<String, String>,
    pub prompt: PromptSettings,
    pub line_editing: LineEditing,
    pub update_check_timeout_secs: u64,
    pub reconcile_timeout_secs: u64,
    pub install_timeout_secs: u64,
    pub max_log_lines: usize,
    pub retained_log_lines: usize,
}

fn default_true() -> bool {
    true
}

fn default_prompt_executable() -> String {
    "oh-my-posh".to_string()
}

fn default_prompt_init_timeout() -> u64 {
    5
}

fn default_reachability_timeout() -> u64 {
    3
}

fn default_update_check_timeout() -> u64 {
    5
}

fn default_reconcile_timeout() -> u64 {
    default_update_check_timeout()
}

fn default_install_timeout() -> u64 {
    120
}

fn default_max_log_lines() -> usize {
    1000
}

fn default_retained_log_lines() -> usize {
    900
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            modules: Vec::new(),
            environment: BTreeMap::new(),
            prompt: PromptSettings::default(),
            line_editing: LineEditing::default(),
            update_check_timeout_secs: default_update_check_timeout(),
            reconcile_timeout_secs: default_reconcile_timeout(),
            install_timeout_secs: default_install_timeout(),
            max_log_lines: default_max_log_lines(),
            retained_log_lines: default_retained_log_lines(),
        }
    }
}

impl Settings {
    /// Read `path`, falling back to defaults for a missing file and, section
    /// by section, for anything that does not parse.
    pub fn load(path: &Path) -> (Self, Vec<SettingsIssue>) {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Self::default(), Vec::new()),
            Err(e) => (
                Self::default(),
                vec![SettingsIssue::Read {
                    path: path.to_path_buf(),
                    details: e.to_string(),
                }],
            ),
        }
    }

    pub fn from_json(content: &str) -> (Self, Vec<SettingsIssue>) {
        let mut settings = Self::default();
        let mut issues = Vec::new();

        let object = match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                issues.push(SettingsIssue::Syntax {
                    details: format!("expected an object, found {}", json_kind(&other)),
                });
                return (settings, issues);
            }
            Err(e) => {
                issues.push(SettingsIssue::Syntax {
                    details: e.to_string(),
                });
                return (settings, issues);
            }
        };

        let mut sections = Sections {
            object: &object,
            issues: &mut issues,
        };
        sections.apply("packages", &mut settings.packages);
        sections.apply("modules", &mut settings.modules);
        sections.apply("environment", &mut settings.environment);
        sections.apply("prompt", &mut settings.prompt);
        sections.apply("line_editing", &mut settings.line_editing);
        sections.apply(
            "update_check_timeout_secs",
            &mut settings.update_check_timeout_secs,
        );
        sections.apply("reconcile_timeout_secs", &mut settings.reconcile_timeout_secs);
        sections.apply("install_timeout_secs", &mut settings.install_timeout_secs);
        sections.apply("max_log_lines", &mut settings.max_log_lines);
        sections.apply("retained_log_lines", &mut settings.retained_log_lines);

        if settings.retained_log_lines > settings.max_log_lines {
            issues.push(SettingsIssue::Section {
                section: "retained_log_lines",
                details: format!(
                    "{} exceeds max_log_lines ({})",
                    settings.retained_log_lines, settings.max_log_lines
                ),
            });
            settings.retained_log_lines = settings.max_log_lines;
        }

        (settings, issues)
    }

    pub fn update_check_timeout(&self) -> Duration {
        Duration::from_secs(self.update_check_timeout_secs)
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }
}

struct Sections<'a> {
    object: &'a Map<String, Value>,
    issues: &'a mut Vec<SettingsIssue>,
}

impl Sections<'_> {
    /// Overwrite `target` with the section when present and well-formed.
    fn apply<T: DeserializeOwned>(&mut self, section: &'static str, target: &mut T) {
        let Some(value) = self.object.get(section) else {
            return;
        };
        match T::deserialize(value) {
            Ok(parsed) => *target = parsed,
            Err(e) => self.issues.push(SettingsIssue::Section {
                section,
                details: e.to_string(),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
