use async_trait::async_trait;
use log::{debug, error, info, trace};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::process::Command;

use shellboot_backend::{InstalledPackage, PackageManager, SourceError};
use shellboot_platform::HideWindow;

use crate::detection::detect_winget;
use crate::table::parse_list_output;

const LIST_ARGS: &[&str] = &[
    "list",
    "--accept-source-agreements",
    "--disable-interactivity",
];

#[derive(Debug, Clone)]
pub struct WingetManager {
    path: Option<PathBuf>,
}

impl WingetManager {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Use whatever `winget` can be found. Queries fail with
    /// [`SourceError::NotFound`] when there is none.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            path: detect_winget(),
        }
    }

    fn build_command(&self, args: &[&str]) -> Result<Command, SourceError> {
        let path = self
            .path
            .as_ref()
            .ok_or(SourceError::NotFound { tool: "winget" })?;
        debug!("Building winget command: {} {}", path.display(), args.join(" "));

        let mut cmd = Command::new(path);
        cmd.args(args);
        cmd.hide_window();
        Ok(cmd)
    }

    async fn execute(&self, args: &[&str]) -> Result<String, SourceError> {
        info!("Executing winget command: {}", args.join(" "));

        let output = self.build_command(args)?.output().await?;

        debug!("winget command exit status: {:?}", output.status);
        trace!("winget stdout: {}", String::from_utf8_lossy(&output.stdout));

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            // winget reports most failures on stdout.
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            error!("winget command failed: args={args:?}, output='{stderr}'");
            Err(SourceError::CommandFailed { stderr })
        }
    }
}

#[async_trait]
impl PackageManager for WingetManager {
    fn name(&self) -> &'static str {
        "winget"
    }

    async fn list_installed(&self, ids: &[String]) -> Result<Vec<InstalledPackage>, SourceError> {
        let output = self.execute(LIST_ARGS).await?;
        let wanted: HashSet<String> = ids.iter().map(|id| id.to_lowercase()).collect();

        let packages: Vec<InstalledPackage> = parse_list_output(&output)
            .into_iter()
            .filter(|package| wanted.contains(&package.id.to_lowercase()))
            .collect();
        debug!(
            "winget: {} of {} requested package(s) installed",
            packages.len(),
            ids.len()
        );
        Ok(packages)
    }
}
