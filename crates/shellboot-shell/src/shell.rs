use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    PowerShell,
    Bash,
    Zsh,
    Fish,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported shell: {0}")]
pub struct UnknownShell(pub String);

impl ShellKind {
    pub const ALL: [ShellKind; 4] = [Self::PowerShell, Self::Bash, Self::Zsh, Self::Fish];

    /// PowerShell on Windows, otherwise the login shell named by `$SHELL`,
    /// falling back to bash.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(windows) {
            return Self::PowerShell;
        }
        std::env::var("SHELL")
            .ok()
            .and_then(|shell| {
                Path::new(&shell)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(|name| name.parse().ok())
            })
            .unwrap_or(Self::Bash)
    }

    /// Name understood by prompt engines such as `oh-my-posh init <shell>`.
    #[must_use]
    pub fn init_name(self) -> &'static str {
        match self {
            Self::PowerShell => "pwsh",
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }

    #[must_use]
    pub fn script_extension(self) -> &'static str {
        match self {
            Self::PowerShell => "ps1",
            Self::Bash | Self::Zsh => "sh",
            Self::Fish => "fish",
        }
    }

    /// Quote `value` as a single literal word.
    #[must_use]
    pub fn quote(self, value: &str) -> String {
        match self {
            Self::PowerShell => format!("'{}'", value.replace('\'', "''")),
            Self::Bash | Self::Zsh => format!("'{}'", value.replace('\'', r"'\''")),
            Self::Fish => format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'")),
        }
    }

    /// Statement that executes the script at `path` in the current shell.
    #[must_use]
    pub fn source_statement(self, path: &Path) -> String {
        let quoted = self.quote(&path.to_string_lossy());
        match self {
            Self::PowerShell => format!(". {quoted}"),
            Self::Bash | Self::Zsh | Self::Fish => format!("source {quoted}"),
        }
    }

    /// Statement that exports an environment variable.
    #[must_use]
    pub fn export_statement(self, name: &str, value: &str) -> String {
        let quoted = self.quote(value);
        match self {
            Self::PowerShell => format!("$env:{name} = {quoted}"),
            Self::Bash | Self::Zsh => format!("export {name}={quoted}"),
            Self::Fish => format!("set -gx {name} {quoted}"),
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PowerShell => "powershell",
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        };
        f.write_str(name)
    }
}

impl FromStr for ShellKind {
    type Err = UnknownShell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pwsh" | "powershell" | "ps" => Ok(Self::PowerShell),
            "bash" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "fish" => Ok(Self::Fish),
            _ => Err(UnknownShell(s.to_string())),
        }
    }
}
