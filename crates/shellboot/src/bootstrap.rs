use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use shellboot_backend::{ModuleRegistry, PackageManager};
use shellboot_core::{
    AsyncCheckHandle, CheckOutcome, CheckSnapshot, LastRunGate, UpdateTarget, launch,
    run_with_timeout,
};
use shellboot_platform::AppPaths;
use shellboot_psgallery::PsGalleryRegistry;
use shellboot_shell::{ActivationScript, OhMyPosh, PromptEngine, ShellKind, initialize_prompt};
use shellboot_winget::WingetManager;

use crate::error::AppError;
use crate::settings::{Settings, SettingsIssue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Gate,
    SyncInstall,
    Configure,
    Reconcile,
    Ready,
}

/// External collaborators, injectable for tests.
pub struct Sources {
    pub packages: Box<dyn PackageManager>,
    pub modules: Box<dyn ModuleRegistry>,
    pub prompt: Arc<dyn PromptEngine>,
}

impl Sources {
    pub fn detect(settings: &Settings) -> Self {
        Self {
            packages: Box::new(WingetManager::detect()),
            modules: Box::new(PsGalleryRegistry::detect()),
            prompt: Arc::new(OhMyPosh::locate(&settings.prompt.executable)),
        }
    }

    /// Owned copy of what the background check needs. Package targets for
    /// another package source are left out with a warning.
    pub fn snapshot(&self, settings: &Settings) -> CheckSnapshot {
        let manager = self.packages.name();
        let package_targets: Vec<UpdateTarget> = settings
            .packages
            .iter()
            .filter(|target| {
                let supported = target.source.eq_ignore_ascii_case(manager);
                if !supported {
                    warn!("Skipping {target}: only {manager} packages are checked");
                }
                supported
            })
            .cloned()
            .collect();

        CheckSnapshot {
            packages: self.packages.clone(),
            modules: self.modules.clone(),
            package_targets,
            module_targets: settings.modules.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub shell: ShellKind,
    pub force: bool,
    pub today: NaiveDate,
}

#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub stages: Vec<Stage>,
    pub check_skipped: bool,
    pub installed: Vec<String>,
    pub prompt: Option<PathBuf>,
    pub activation: Option<PathBuf>,
    pub updates: Option<CheckOutcome>,
    pub warnings: Vec<String>,
}

impl BootstrapReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// The startup sequence: Init, Gate, SyncInstall, Configure, Reconcile, Ready.
///
/// Every stage degrades to a warning, so [`Bootstrap::run`] always ends in
/// [`Stage::Ready`]. SyncInstall only runs when the gate lets the update
/// check through.
pub struct Bootstrap {
    settings: Settings,
    issues: Vec<SettingsIssue>,
    paths: AppPaths,
    sources: Sources,
    options: RunOptions,
}

impl Bootstrap {
    pub fn new(
        settings: Settings,
        issues: Vec<SettingsIssue>,
        paths: AppPaths,
        sources: Sources,
        options: RunOptions,
    ) -> Self {
        Self {
            settings,
            issues,
            paths,
            sources,
            options,
        }
    }

    pub async fn run(self) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        let mut handle: Option<AsyncCheckHandle> = None;
        let mut stage = Stage::Init;

        loop {
            debug!("Bootstrap stage: {stage:?}");
            report.stages.push(stage);
            stage = match stage {
                Stage::Init => {
                    self.init(&mut report);
                    Stage::Gate
                }
                Stage::Gate => {
                    handle = self.gate(&mut report);
                    if report.check_skipped {
                        Stage::Configure
                    } else {
                        Stage::SyncInstall
                    }
                }
                Stage::SyncInstall => {
                    self.sync_install(&mut report).await;
                    Stage::Configure
                }
                Stage::Configure => {
                    self.configure(&mut report).await;
                    Stage::Reconcile
                }
                Stage::Reconcile => {
                    if let Some(handle) = handle.take() {
                        report.updates = reconcile(handle, self.settings.reconcile_timeout()).await;
                    }
                    Stage::Ready
                }
                Stage::Ready => break,
            };
        }

        info!(
            "Bootstrap ready for {} ({} warning(s))",
            self.options.shell,
            report.warnings.len()
        );
        report
    }

    fn init(&self, report: &mut BootstrapReport) {
        for issue in &self.issues {
            report.warn(issue.to_string());
        }
        if let Err(e) = self.paths.ensure_dirs() {
            report.warn(format!("Failed to create application directories: {e}"));
        }
    }

    fn gate(&self, report: &mut BootstrapReport) -> Option<AsyncCheckHandle> {
        if self.options.force {
            info!("Update check forced, last-run marker left untouched");
        } else {
            let gate = LastRunGate::new(self.paths.marker_file());
            if gate.should_skip(self.options.today) {
                info!("Update check already ran today, skipping checks and installs");
                report.check_skipped = true;
                return None;
            }
        }

        let snapshot = self.sources.snapshot(&self.settings);
        if snapshot.package_targets.is_empty() && snapshot.module_targets.is_empty() {
            debug!("No update targets configured");
            return None;
        }
        Some(launch(snapshot))
    }

    async fn sync_install(&self, report: &mut BootstrapReport) {
        let registry = self.sources.modules.as_ref();
        let timeout = self.settings.install_timeout();
        let mut seen = HashSet::new();

        for target in &self.settings.modules {
            if !seen.insert(target.identifier.to_lowercase()) {
                continue;
            }
            match install_if_missing(registry, target, timeout).await {
                Ok(true) => report.installed.push(target.identifier.clone()),
                Ok(false) => {}
                Err(AppError::Source { operation, source }) if source.is_source_level() => {
                    report.warn(format!(
                        "{operation} failed, skipping remaining installs: {source}"
                    ));
                    break;
                }
                Err(e) => report.warn(format!("Could not install {target}: {e}")),
            }
        }
    }

    async fn configure(&self, report: &mut BootstrapReport) {
        let shell = self.options.shell;
        let extension = shell.script_extension();
        let mut script = ActivationScript::new(shell);

        for name in script.add_environment(&self.settings.environment) {
            report
                .warnings
                .push(format!("Skipped environment variable with invalid name {name:?}"));
        }

        if self.settings.prompt.enabled {
            let cache = self.paths.prompt_cache_file(extension);
            match initialize_prompt(
                Arc::clone(&self.sources.prompt),
                shell,
                &self.settings.prompt.options(&self.paths.config_dir),
                &cache,
            )
            .await
            {
                Ok(path) => {
                    script.set_prompt(path.clone());
                    report.prompt = Some(path);
                }
                Err(e) => report.warn(format!("Prompt theming skipped: {e}")),
            }
        } else {
            debug!("Prompt theming disabled");
        }

        script.set_line_editing(self.settings.line_editing.clone());

        let target = self.paths.activation_file(extension);
        match script.write(&target) {
            Ok(()) => {
                debug!("Activation script written to {}", target.display());
                report.activation = Some(target);
            }
            Err(e) => report.warn(e.to_string()),
        }
    }
}

/// `Ok(true)` when the module was missing and got installed.
async fn install_if_missing(
    registry: &dyn ModuleRegistry,
    target: &UpdateTarget,
    timeout: Duration,
) -> Result<bool, AppError> {
    let installed = run_with_timeout(
        timeout,
        "module lookup",
        registry.installed_version(&target.identifier),
        |e| AppError::source_failed("Module lookup", e),
    )
    .await?;

    if let Some(version) = installed {
        debug!("{} {version} already installed", target.identifier);
        return Ok(false);
    }

    info!("Installing missing module {target}");
    run_with_timeout(
        timeout,
        "module install",
        registry.install(&target.identifier, &target.source),
        |e| AppError::source_failed("Module install", e),
    )
    .await?;
    Ok(true)
}

async fn reconcile(handle: AsyncCheckHandle, timeout: Duration) -> Option<CheckOutcome> {
    let outcome = handle.wait(timeout).await?;
    for notice in outcome
        .packages
        .notices()
        .iter()
        .chain(outcome.modules.notices())
    {
        info!("Update available: {notice}");
    }
    Some(outcome)
}
