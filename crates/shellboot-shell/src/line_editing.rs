use serde::Deserialize;

use crate::shell::ShellKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Emacs,
    Vi,
}

/// Interactive line-editing preferences applied at the end of bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineEditing {
    #[serde(default)]
    pub edit_mode: EditMode,

    #[serde(default = "default_true")]
    pub history_no_duplicates: bool,

    #[serde(default = "default_true")]
    pub predictions: bool,

    #[serde(default)]
    pub bell: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LineEditing {
    fn default() -> Self {
        Self {
            edit_mode: EditMode::default(),
            history_no_duplicates: true,
            predictions: true,
            bell: false,
        }
    }
}

impl LineEditing {
    /// Commands that apply these preferences in `shell`.
    #[must_use]
    pub fn render(&self, shell: ShellKind) -> Vec<String> {
        match shell {
            ShellKind::PowerShell => self.render_powershell(),
            ShellKind::Bash => self.render_bash(),
            ShellKind::Zsh => self.render_zsh(),
            ShellKind::Fish => self.render_fish(),
        }
    }

    fn render_powershell(&self) -> Vec<String> {
        let mode = match self.edit_mode {
            EditMode::Emacs => "Emacs",
            EditMode::Vi => "Vi",
        };
        let mut options = vec![format!("-EditMode {mode}")];
        options.push(format!(
            "-HistoryNoDuplicates:${}",
            self.history_no_duplicates
        ));
        options.push(format!(
            "-PredictionSource {}",
            if self.predictions { "History" } else { "None" }
        ));
        options.push(format!(
            "-BellStyle {}",
            if self.bell { "Audible" } else { "None" }
        ));

        vec![
            "if (Get-Command Set-PSReadLineOption -ErrorAction SilentlyContinue) {".to_string(),
            format!("    Set-PSReadLineOption {}", options.join(" ")),
            "}".to_string(),
        ]
    }

    fn render_bash(&self) -> Vec<String> {
        let mut lines = vec![match self.edit_mode {
            EditMode::Emacs => "set -o emacs".to_string(),
            EditMode::Vi => "set -o vi".to_string(),
        }];
        if self.history_no_duplicates {
            lines.push("export HISTCONTROL=ignoreboth:erasedups".to_string());
        }
        lines.push(format!(
            "bind 'set bell-style {}'",
            if self.bell { "audible" } else { "none" }
        ));
        lines
    }

    fn render_zsh(&self) -> Vec<String> {
        let mut lines = vec![match self.edit_mode {
            EditMode::Emacs => "bindkey -e".to_string(),
            EditMode::Vi => "bindkey -v".to_string(),
        }];
        if self.history_no_duplicates {
            lines.push("setopt HIST_IGNORE_ALL_DUPS".to_string());
        }
        lines.push(if self.bell {
            "setopt BEEP".to_string()
        } else {
            "unsetopt BEEP".to_string()
        });
        lines
    }

    fn render_fish(&self) -> Vec<String> {
        let mut lines = vec![match self.edit_mode {
            EditMode::Emacs => "fish_default_key_bindings".to_string(),
            EditMode::Vi => "fish_vi_key_bindings".to_string(),
        }];
        lines.push(format!(
            "set -g fish_autosuggestion_enabled {}",
            u8::from(self.predictions)
        ));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::{EditMode, LineEditing};
    use crate::shell::ShellKind;

    #[test]
    fn defaults_match_missing_fields() {
        let parsed: LineEditing = serde_json::from_str("{}").expect("empty object should parse");

        assert_eq!(parsed, LineEditing::default());
        assert!(parsed.history_no_duplicates);
        assert!(!parsed.bell);
    }

    #[test]
    fn powershell_options_are_guarded_by_psreadline() {
        let lines = LineEditing::default().render(ShellKind::PowerShell);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Get-Command Set-PSReadLineOption"));
        assert_eq!(
            lines[1].trim(),
            "Set-PSReadLineOption -EditMode Emacs -HistoryNoDuplicates:$true \
             -PredictionSource History -BellStyle None"
        );
    }

    #[test]
    fn vi_mode_renders_per_shell() {
        let editing = LineEditing {
            edit_mode: EditMode::Vi,
            history_no_duplicates: false,
            predictions: false,
            bell: true,
        };

        assert_eq!(
            editing.render(ShellKind::Bash),
            vec!["set -o vi", "bind 'set bell-style audible'"]
        );
        assert_eq!(
            editing.render(ShellKind::Zsh),
            vec!["bindkey -v", "setopt BEEP"]
        );
        assert_eq!(
            editing.render(ShellKind::Fish),
            vec!["fish_vi_key_bindings", "set -g fish_autosuggestion_enabled 0"]
        );
    }
}
