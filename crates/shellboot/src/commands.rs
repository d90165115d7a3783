use chrono::Local;
use log::info;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use shellboot_core::{CheckOutcome, LastRunGate, launch};
use shellboot_platform::AppPaths;
use shellboot_shell::ShellKind;

use crate::bootstrap::{Bootstrap, RunOptions, Sources};
use crate::cli::{CheckArgs, RunArgs};
use crate::error::AppError;
use crate::settings::{Settings, SettingsIssue};

/// Always succeeds once the sequence reaches Ready.
pub async fn run(
    args: RunArgs,
    settings: Settings,
    issues: Vec<SettingsIssue>,
    paths: AppPaths,
) -> ExitCode {
    let shell = args.shell.unwrap_or_else(ShellKind::detect);
    let sources = Sources::detect(&settings);
    let options = RunOptions {
        shell,
        force: args.force,
        today: Local::now().date_naive(),
    };

    let report = Bootstrap::new(settings, issues, paths, sources, options)
        .run()
        .await;

    for module in &report.installed {
        println!("Installed module {module}");
    }
    if let Some(outcome) = &report.updates {
        print_updates(outcome);
    }
    if let Some(activation) = &report.activation {
        info!("Source {} to finish shell setup", activation.display());
    }
    ExitCode::SUCCESS
}

pub async fn check(args: CheckArgs, settings: &Settings) -> ExitCode {
    let timeout = args
        .timeout
        .map_or_else(|| settings.update_check_timeout(), Duration::from_secs);
    let snapshot = Sources::detect(settings).snapshot(settings);

    match launch(snapshot).wait(timeout).await {
        Some(outcome) => {
            print_updates(&outcome);
            if outcome.is_up_to_date() {
                println!("Everything is up to date.");
            }
            ExitCode::SUCCESS
        }
        None => {
            eprintln!(
                "Update check did not finish within {}s",
                timeout.as_secs()
            );
            ExitCode::FAILURE
        }
    }
}

pub fn reset(paths: &AppPaths) -> Result<(), AppError> {
    let gate = LastRunGate::new(paths.marker_file());
    gate.reset()?;
    println!("Removed {}", gate.marker_path().display());
    Ok(())
}

pub fn print_paths(paths: &AppPaths, settings_file: &Path) {
    println!("settings:   {}", settings_file.display());
    println!("marker:     {}", paths.marker_file().display());
    println!("log:        {}", paths.log_file().display());
    for shell in ShellKind::ALL {
        println!(
            "activation: {} ({shell})",
            paths.activation_file(shell.script_extension()).display()
        );
    }
}

fn print_updates(outcome: &CheckOutcome) {
    for notice in outcome.packages.notices() {
        println!("Package update available: {notice}");
    }
    for notice in outcome.modules.notices() {
        println!("Module update available: {notice}");
    }
}
