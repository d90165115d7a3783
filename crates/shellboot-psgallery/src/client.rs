use log::{debug, trace};
use std::path::PathBuf;
use tokio::process::Command;
use which::which;

use shellboot_backend::SourceError;
use shellboot_platform::HideWindow;

const MODULE_VAR: &str = "SHELLBOOT_MODULE";
const REPOSITORY_VAR: &str = "SHELLBOOT_REPOSITORY";

// Names travel through environment variables, never through the script text.
const INSTALLED_VERSION_SCRIPT: &str = "\
$ErrorActionPreference = 'Stop'
$m = Get-InstalledModule -Name $env:SHELLBOOT_MODULE -ErrorAction SilentlyContinue | Select-Object -First 1
if (-not $m) {
    $m = Get-Module -ListAvailable -Name $env:SHELLBOOT_MODULE | Sort-Object Version -Descending | Select-Object -First 1
}
if ($m) { $m.Version.ToString() }";

const AVAILABLE_VERSION_SCRIPT: &str = "\
$ErrorActionPreference = 'Stop'
$m = Find-Module -Name $env:SHELLBOOT_MODULE -Repository $env:SHELLBOOT_REPOSITORY | Select-Object -First 1
$m.Version.ToString()";

const INSTALL_SCRIPT: &str = "\
$ErrorActionPreference = 'Stop'
Install-Module -Name $env:SHELLBOOT_MODULE -Repository $env:SHELLBOOT_REPOSITORY -Scope CurrentUser -Force -AllowClobber";

/// Locate a PowerShell host, preferring PowerShell 7 (`pwsh`).
#[must_use]
pub fn detect_powershell() -> Option<PathBuf> {
    which("pwsh").or_else(|_| which("powershell")).ok()
}

#[derive(Debug, Clone)]
pub struct PowerShellClient {
    host: Option<PathBuf>,
}

impl PowerShellClient {
    #[must_use]
    pub fn new(host: PathBuf) -> Self {
        Self { host: Some(host) }
    }

    #[must_use]
    pub fn detect() -> Self {
        Self {
            host: detect_powershell(),
        }
    }

    fn build_command(
        &self,
        script: &str,
        module: &str,
        repository: Option<&str>,
    ) -> Result<Command, SourceError> {
        let host = self
            .host
            .as_ref()
            .ok_or(SourceError::NotFound { tool: "pwsh" })?;
        debug!("Building PowerShell command for module {module} via {}", host.display());

        let mut cmd = Command::new(host);
        cmd.args(["-NoLogo", "-NoProfile", "-NonInteractive", "-Command", script]);
        cmd.env(MODULE_VAR, module);
        if let Some(repository) = repository {
            cmd.env(REPOSITORY_VAR, repository);
        }
        cmd.env("NO_COLOR", "1");
        cmd.hide_window();
        Ok(cmd)
    }

    async fn execute(
        &self,
        script: &str,
        module: &str,
        repository: Option<&str>,
    ) -> Result<String, SourceError> {
        let output = self
            .build_command(script, module, repository)?
            .output()
            .await?;

        trace!("PowerShell stdout: {}", String::from_utf8_lossy(&output.stdout));

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(classify_failure(repository, stderr))
        }
    }

    /// Installed version of `module`, or `None` when it is not installed.
    ///
    /// # Errors
    /// Returns an error if the PowerShell host cannot be run or the query fails.
    pub async fn installed_version(&self, module: &str) -> Result<Option<String>, SourceError> {
        let output = self.execute(INSTALLED_VERSION_SCRIPT, module, None).await?;
        Ok(last_line(&output))
    }

    /// Version of `module` published in `repository`.
    ///
    /// # Errors
    /// Returns an error if the repository is unreachable or the module is not
    /// published there.
    pub async fn available_version(
        &self,
        module: &str,
        repository: &str,
    ) -> Result<String, SourceError> {
        let output = self
            .execute(AVAILABLE_VERSION_SCRIPT, module, Some(repository))
            .await?;
        last_line(&output).ok_or_else(|| {
            SourceError::parse("available module version", format!("empty output for {module}"))
        })
    }

    /// Install `module` from `repository` for the current user.
    ///
    /// # Errors
    /// Returns an error if the installation fails.
    pub async fn install(&self, module: &str, repository: &str) -> Result<(), SourceError> {
        self.execute(INSTALL_SCRIPT, module, Some(repository))
            .await
            .map(|_| ())
            .map_err(|e| match e {
                SourceError::CommandFailed { stderr } => SourceError::install_failed(module, stderr),
                other => other,
            })
    }
}

fn last_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
}

/// Map PowerShellGet failures that concern the whole repository to
/// [`SourceError::Unavailable`]; everything else stays per module.
fn classify_failure(repository: Option<&str>, stderr: String) -> SourceError {
    const REPOSITORY_DOWN: &[&str] = &[
        "Unable to find repository",
        "Unable to resolve package source",
        "unable to access",
        "No such host is known",
    ];

    if let Some(repository) = repository
        && REPOSITORY_DOWN.iter().any(|needle| stderr.contains(needle))
    {
        let name: &'static str = if repository.eq_ignore_ascii_case("PSGallery") {
            "PSGallery"
        } else {
            "module repository"
        };
        return SourceError::unavailable(name, stderr);
    }

    SourceError::CommandFailed { stderr }
}
