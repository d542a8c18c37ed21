//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Castle diorama command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "diorama", about = "Castle diorama with a day/night cycle")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fixed seed for prop scattering.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Time-of-day increment per frame.
    #[arg(long)]
    pub cycle_step: Option<f64>,

    /// Season whose textures are used.
    #[arg(long)]
    pub season: Option<String>,

    /// Asset root directory.
    #[arg(long)]
    pub assets: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(seed) = args.seed {
            self.scene.seed = Some(seed);
        }
        if let Some(step) = args.cycle_step {
            self.cycle.step = step;
        }
        if let Some(ref season) = args.season {
            self.scene.season = season.clone();
        }
        if let Some(ref root) = args.assets {
            self.scene.asset_root = root.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            seed: Some(42),
            cycle_step: Some(0.05),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.scene.seed, Some(42));
        assert_eq!(config.cycle.step, 0.05);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
        assert_eq!(config.scene.season, "summer");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["diorama", "--seed", "9", "--assets", "/tmp/a"]);
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.assets, Some(PathBuf::from("/tmp/a")));
    }
}
