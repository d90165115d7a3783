use log::warn;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::line_editing::LineEditing;
use crate::shell::ShellKind;

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("Failed to write activation script {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Commands the calling shell runs to finish the bootstrap.
///
/// A child process cannot change its parent shell, so environment variables,
/// the prompt and line editing all end up in one script that the shell
/// profile sources after `shellboot run`.
#[derive(Debug, Clone)]
pub struct ActivationScript {
    shell: ShellKind,
    environment: BTreeMap<String, String>,
    prompt: Option<PathBuf>,
    line_editing: Option<LineEditing>,
}

impl ActivationScript {
    #[must_use]
    pub fn new(shell: ShellKind) -> Self {
        Self {
            shell,
            environment: BTreeMap::new(),
            prompt: None,
            line_editing: None,
        }
    }

    /// Add variables, skipping names that are not valid identifiers.
    /// Returns the skipped names.
    pub fn add_environment<'a>(
        &mut self,
        variables: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Vec<String> {
        let mut skipped = Vec::new();
        for (name, value) in variables {
            if is_identifier(name) {
                self.environment.insert(name.clone(), value.clone());
            } else {
                warn!("Skipping environment variable with invalid name: {name:?}");
                skipped.push(name.clone());
            }
        }
        skipped
    }

    pub fn set_prompt(&mut self, compiled: PathBuf) {
        self.prompt = Some(compiled);
    }

    pub fn set_line_editing(&mut self, line_editing: LineEditing) {
        self.line_editing = Some(line_editing);
    }

    #[must_use]
    pub fn shell(&self) -> ShellKind {
        self.shell
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = vec![format!("# Generated by shellboot for {}", self.shell)];

        for (name, value) in &self.environment {
            lines.push(self.shell.export_statement(name, value));
        }
        if let Some(prompt) = &self.prompt {
            lines.push(self.shell.source_statement(prompt));
        }
        if let Some(line_editing) = &self.line_editing {
            lines.extend(line_editing.render(self.shell));
        }

        let mut script = lines.join("\n");
        script.push('\n');
        script
    }

    /// # Errors
    /// Returns an error if the script cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), ActivationError> {
        write_atomically(path, &self.render()).map_err(|source| ActivationError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Replace `path` with `contents` so readers never see a partial file.
pub(crate) fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target path has no parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::{ActivationScript, is_identifier};
    use crate::line_editing::LineEditing;
    use crate::shell::ShellKind;

    fn environment() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("TENANT_URL".to_string(), "https://tenant.example".to_string()),
            ("DATABASE".to_string(), "o'brien".to_string()),
            ("BAD NAME".to_string(), "x".to_string()),
        ])
    }

    #[test]
    fn identifiers_follow_shell_rules() {
        assert!(is_identifier("_PRIVATE"));
        assert!(is_identifier("TENANT_URL2"));
        assert!(!is_identifier("2FAST"));
        assert!(!is_identifier("A-B"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn invalid_names_are_skipped() {
        let mut script = ActivationScript::new(ShellKind::Bash);

        let skipped = script.add_environment(&environment());

        assert_eq!(skipped, vec!["BAD NAME".to_string()]);
        assert!(!script.render().contains("BAD NAME"));
    }

    #[test]
    fn bash_script_orders_environment_prompt_and_editing() {
        let mut script = ActivationScript::new(ShellKind::Bash);
        script.add_environment(&environment());
        script.set_prompt(PathBuf::from("/cache/prompt-init.sh"));
        script.set_line_editing(LineEditing::default());

        let rendered = script.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines,
            vec![
                "# Generated by shellboot for bash",
                r"export DATABASE='o'\''brien'",
                "export TENANT_URL='https://tenant.example'",
                "source '/cache/prompt-init.sh'",
                "set -o emacs",
                "export HISTCONTROL=ignoreboth:erasedups",
                "bind 'set bell-style none'",
            ]
        );
    }

    #[test]
    fn powershell_script_without_prompt() {
        let mut script = ActivationScript::new(ShellKind::PowerShell);
        script.add_environment(&environment());

        let rendered = script.render();

        assert!(rendered.contains("$env:DATABASE = 'o''brien'"));
        assert!(!rendered.contains(". '"));
    }

    #[test]
    fn write_replaces_existing_script() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("data").join("activate.fish");
        std::fs::create_dir_all(path.parent().expect("path should have a parent"))
            .expect("create data dir");
        std::fs::write(&path, "stale").expect("write stale script");

        let mut script = ActivationScript::new(ShellKind::Fish);
        script.set_line_editing(LineEditing::default());
        script.write(&path).expect("script should be written");

        let written = std::fs::read_to_string(&path).expect("read script");
        assert!(written.starts_with("# Generated by shellboot for fish\n"));
        assert!(written.contains("fish_default_key_bindings"));
    }
}
