//! The `diorama` binary.

use std::process::ExitCode;

use clap::Parser;
use diorama_app::PlatformDirs;
use diorama_config::{CliArgs, Config};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = PlatformDirs::resolve();
    let config_dir = args
        .config
        .clone()
        .or_else(|| dirs.as_ref().ok().map(|d| d.config_dir.clone()));

    let (mut config, load_error) = match &config_dir {
        Some(dir) => match Config::load_or_create(dir) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
        None => (Config::default(), None),
    };
    config.apply_cli_overrides(&args);

    let log_dir = match &dirs {
        Ok(d) => d.create_dirs().ok().map(|()| d.log_dir.as_path()),
        Err(_) => None,
    };
    diorama_log::init_logging(log_dir, cfg!(debug_assertions), Some(&config));

    if let Err(e) = &dirs {
        warn!("{e}, config and logs will not persist");
    }
    if let Some(e) = load_error {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!(
        width = config.window.width,
        height = config.window.height,
        season = %config.scene.season,
        "starting castle diorama"
    );

    match diorama_app::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
