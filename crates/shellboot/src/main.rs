mod bootstrap;
mod cli;
mod commands;
mod error;
mod logging;
mod settings;

use clap::Parser;
use log::{debug, warn};
use std::process::ExitCode;

use shellboot_platform::AppPaths;

use crate::cli::{Cli, Commands};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match AppPaths::new() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let settings_file = cli.config.clone().unwrap_or_else(|| paths.settings_file());
    let (settings, issues) = Settings::load(&settings_file);

    logging::init_logging(
        &paths.log_file(),
        cli.debug,
        settings.max_log_lines,
        settings.retained_log_lines,
    );
    debug!("shellboot starting with args: {cli:?}");

    match cli.command {
        Commands::Run(args) => commands::run(args, settings, issues, paths).await,
        Commands::Check(args) => {
            for issue in &issues {
                warn!("{issue}");
            }
            commands::check(args, &settings).await
        }
        Commands::Reset => match commands::reset(&paths) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Paths => {
            commands::print_paths(&paths, &settings_file);
            ExitCode::SUCCESS
        }
    }
}
