//! Configuration structs with sensible defaults and RON persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Length of one full day/night cycle in time-of-day units.
const CYCLE_LENGTH: f64 = 6.0;

/// Largest scatter half-extent whose full span `2 * bounds` is still finite.
pub const MAX_SCATTER_BOUNDS: f32 = f32::MAX / 2.0;

/// Top-level diorama configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Camera and camera-control settings.
    pub camera: CameraConfig,
    /// Day/night cycle settings.
    pub cycle: CycleConfig,
    /// Scene assembly settings.
    pub scene: SceneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title prefix. The current phase label is appended at runtime.
    pub title: String,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Initial camera position.
    pub start_position: [f32; 3],
    /// Point the orbit controls circle around.
    pub target: [f32; 3],
    /// Distance moved per arrow/plus/minus keydown.
    pub key_step: f32,
    /// Smooth orbit rotation with inertia.
    pub enable_damping: bool,
    /// Fraction of pending rotation consumed per update when damping.
    pub damping_factor: f32,
    /// Multiplier on drag rotation.
    pub rotate_speed: f32,
    /// Multiplier on wheel zoom.
    pub zoom_speed: f32,
}

/// Day/night cycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CycleConfig {
    /// Time-of-day increment per rendered frame.
    pub step: f64,
    /// Time of day at startup, in `[0, 6)`.
    pub start_time: f64,
}

/// Texture paths for one season, relative to the asset root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonTextures {
    /// Billboard texture for scattered trees.
    pub tree: PathBuf,
    /// Ground plane texture.
    pub foreground: PathBuf,
}

/// Scene assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for prop scattering. `None` picks a fresh seed every run.
    pub seed: Option<u64>,
    /// Active season; must be a key of `seasons`.
    pub season: String,
    /// Texture sets by season name.
    pub seasons: BTreeMap<String, SeasonTextures>,
    /// Number of tree billboards.
    pub tree_count: usize,
    /// Number of cliff clones.
    pub cliff_count: usize,
    /// Half-width of the square kept clear around the castle.
    pub exclusion_half_width: f32,
    /// Half-width of the square props are scattered in.
    pub scatter_bounds: f32,
    /// Samples tried per prop before falling back to the exclusion edge.
    pub max_scatter_attempts: u32,
    /// Directory all asset paths are resolved against.
    pub asset_root: PathBuf,
    /// Cliff glTF model, relative to the asset root.
    pub cliff_model: PathBuf,
    /// Castle glTF model, relative to the asset root.
    pub castle_model: PathBuf,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log frame statistics every this many frames (0 disables).
    pub stats_interval_frames: u64,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Castle Diorama".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            start_position: [0.0, 20.0, 50.0],
            target: [0.0, 0.0, 0.0],
            key_step: 2.0,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            step: 0.01,
            start_time: 0.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        let mut seasons = BTreeMap::new();
        seasons.insert(
            "summer".to_string(),
            SeasonTextures {
                tree: PathBuf::from("summer_tree.png"),
                foreground: PathBuf::from("summer_foreground.JPG"),
            },
        );
        Self {
            seed: None,
            season: "summer".to_string(),
            seasons,
            tree_count: 40,
            cliff_count: 8,
            exclusion_half_width: 40.0,
            scatter_bounds: 150.0,
            max_scatter_attempts: 1000,
            asset_root: PathBuf::from("assets"),
            cliff_model: PathBuf::from("models/cliff/scene.gltf"),
            castle_model: PathBuf::from("models/castle/scene.gltf"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval_frames: 120,
        }
    }
}

impl SceneConfig {
    /// Textures of the active season, if it is configured.
    pub fn active_season(&self) -> Option<&SeasonTextures> {
        self.seasons.get(&self.season)
    }

    /// Resolve a path relative to the asset root.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.asset_root.join(relative)
    }
}

// --- Load / Save / Reload ---

/// File name of the persisted config inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Load `config.ron` from `config_dir`, writing the defaults there first
    /// when it does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            return Ok(config);
        }
        let config = Config::default();
        config.save(config_dir)?;
        log::info!("Created default config at {}", config_path.display());
        Ok(config)
    }

    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ConfigError::Write { path, source }
        };
        std::fs::create_dir_all(config_dir).map_err(write_err(config_dir))?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, serialized).map_err(write_err(&config_path))
    }

    /// Re-read the file. `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join(CONFIG_FILE_NAME))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject values the cycle and scatterer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cycle = &self.cycle;
        if !cycle.step.is_finite() || cycle.step <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "cycle.step",
                reason: format!("must be a positive finite number, got {}", cycle.step),
            });
        }
        if !(0.0..CYCLE_LENGTH).contains(&cycle.start_time) {
            return Err(ConfigError::Invalid {
                field: "cycle.start_time",
                reason: format!("must lie in [0, 6), got {}", cycle.start_time),
            });
        }

        let scene = &self.scene;
        if !(scene.scatter_bounds.is_finite() && scene.scatter_bounds <= MAX_SCATTER_BOUNDS) {
            return Err(ConfigError::Invalid {
                field: "scene.scatter_bounds",
                reason: format!(
                    "must be finite and at most {MAX_SCATTER_BOUNDS:e}, got {}",
                    scene.scatter_bounds
                ),
            });
        }
        if !(scene.exclusion_half_width >= 0.0 && scene.exclusion_half_width < scene.scatter_bounds)
        {
            return Err(ConfigError::Invalid {
                field: "scene.exclusion_half_width",
                reason: format!(
                    "must be non-negative and below scatter_bounds ({}), got {}",
                    scene.scatter_bounds, scene.exclusion_half_width
                ),
            });
        }
        if scene.max_scatter_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "scene.max_scatter_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if scene.active_season().is_none() {
            return Err(ConfigError::Invalid {
                field: "scene.season",
                reason: format!("no textures configured for season `{}`", scene.season),
            });
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid {
                field: "camera.near",
                reason: format!(
                    "need 0 < near < far, got near {} far {}",
                    camera.near, camera.far
                ),
            });
        }
        Ok(())
    }
}
