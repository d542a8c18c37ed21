//! Configuration for the castle diorama.
//!
//! Settings persist to disk as a RON file, can be overridden from the command
//! line via clap, and are validated before the scene is assembled.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, CameraConfig, Config, CycleConfig, DebugConfig, MAX_SCATTER_BOUNDS,
    SceneConfig, SeasonTextures, WindowConfig,
};
pub use error::ConfigError;
