//! The running diorama: the scene plus every piece of state the frame loop
//! and input handlers touch.

use diorama_assets::AsyncModelLoader;
use diorama_config::{Config, ConfigError, SceneConfig};
use diorama_input::CameraKey;
use diorama_scene::{Camera, Color, ModelTemplate, Scene};
use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{debug, info, warn};

use crate::assembler::{
    SceneHandles, SeasonAssets, assemble_static, place_castle, place_cliffs, plant_trees,
    retexture_ground,
};
use crate::bridge::{BridgeState, Drawbridge};
use crate::controls::OrbitControls;
use crate::cycle::{CycleFrame, DayNightCycle};
use crate::error::{DioramaError, viewport_aspect};
use crate::label::PhaseLabel;
use crate::scatter::{ScatterParams, place_random_instances};

/// Loader key for the castle model.
pub const CASTLE_KEY: &str = "castle";
/// Loader key for the cliff model.
pub const CLIFF_KEY: &str = "cliff";
/// Sky color before the first frame.
pub const INITIAL_SKY: u32 = 0x87CEEB;

const LOADER_WORKERS: usize = 1;
const LOADER_QUEUE: usize = 4;

pub struct Diorama {
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    cycle: DayNightCycle,
    bridge: Drawbridge,
    label: PhaseLabel,
    handles: SceneHandles,
    clear_color: Color,
    key_step: f32,
    scene_config: SceneConfig,
    season: String,
    seed: u64,
    rng: Xoshiro256StarStar,
    cliff_sites: Vec<Vec2>,
    loader: Option<AsyncModelLoader>,
}

impl Diorama {
    /// Assemble the diorama from disk: load the active season's textures and
    /// queue the cliff and castle models on a background worker.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let (assets, _) = SeasonAssets::load(&config.scene, &config.scene.season).map_err(|e| {
            ConfigError::Invalid {
                field: "scene.season",
                reason: e.to_string(),
            }
        })?;

        let loader = match AsyncModelLoader::new(LOADER_WORKERS, LOADER_QUEUE) {
            Ok(loader) => Some(loader),
            Err(source) => {
                warn!(
                    "{}",
                    DioramaError::AssetLoadFailure {
                        asset: "model loader".into(),
                        source,
                    }
                );
                None
            }
        };

        let diorama = Self::with_assets(config, assets, loader)?;
        diorama.request_models();
        Ok(diorama)
    }

    /// Assemble with already-loaded textures. Without a loader the models
    /// only appear through [`Diorama::insert_model`].
    pub fn with_assets(
        config: &Config,
        assets: SeasonAssets,
        loader: Option<AsyncModelLoader>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let cycle = DayNightCycle::from_config(&config.cycle)?;

        let seed = config.scene.seed.unwrap_or_else(rand::random);
        info!(seed, season = %assets.season, "assembling diorama");
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);

        let camera_config = &config.camera;
        let aspect_ratio = viewport_aspect(config.window.width, config.window.height)
            .unwrap_or_else(|e| clamped_aspect(&e));
        let camera = Camera {
            position: Vec3::from(camera_config.start_position),
            target: Vec3::from(camera_config.target),
            up: Vec3::Y,
            fov_y: camera_config.fov_y_degrees.to_radians(),
            aspect_ratio,
            near: camera_config.near,
            far: camera_config.far,
        };

        let mut scene = Scene::new();
        let mut handles = assemble_static(&mut scene, &assets);
        plant_trees(
            &mut scene,
            &mut handles.trees,
            assets.tree.clone(),
            tree_params(&config.scene),
            &mut rng,
        );
        let cliff_sites = place_random_instances(
            &mut rng,
            ScatterParams {
                count: config.scene.cliff_count,
                ..tree_params(&config.scene)
            },
        )
        .points;

        let mut label = PhaseLabel::new();
        label.set(cycle.phase());

        Ok(Self {
            bridge: Drawbridge::new(handles.drawbridge),
            controls: OrbitControls::from_config(camera_config),
            scene,
            camera,
            cycle,
            label,
            handles,
            clear_color: Color::from_hex(INITIAL_SKY),
            key_step: camera_config.key_step,
            scene_config: config.scene.clone(),
            season: assets.season,
            seed,
            rng,
            cliff_sites,
            loader,
        })
    }

    fn request_models(&self) {
        let Some(loader) = &self.loader else {
            return;
        };
        let requests = [
            (CLIFF_KEY, &self.scene_config.cliff_model),
            (CASTLE_KEY, &self.scene_config.castle_model),
        ];
        for (key, path) in requests {
            if let Err(source) = loader.request(key, self.scene_config.resolve(path)) {
                warn!(
                    "{}",
                    DioramaError::AssetLoadFailure {
                        asset: key.into(),
                        source,
                    }
                );
            }
        }
    }

    /// Run one frame of simulation: pick up finished model loads, apply
    /// camera motion, then advance the cycle and push it into the scene.
    pub fn frame(&mut self) -> CycleFrame {
        self.poll_assets();
        self.controls.update(&mut self.camera);
        let frame = self.cycle.advance();
        self.apply_cycle(&frame);
        frame
    }

    fn apply_cycle(&mut self, frame: &CycleFrame) {
        if let Some(sun) = self.scene.get_mut(self.handles.sun) {
            sun.visible = frame.sun_visible;
        }
        if let Some(moon) = self.scene.get_mut(self.handles.moon) {
            moon.visible = frame.moon_visible;
        }
        self.scene.lights.directional.intensity = frame.light_intensity;
        self.clear_color = frame.sky_color;
        if self.label.set(frame.phase) {
            debug!(phase = %frame.phase, time_of_day = frame.time_of_day, "phase changed");
        }
    }

    /// Place every model the loader has finished. Returns how many arrived.
    pub fn poll_assets(&mut self) -> usize {
        let Some(loader) = &self.loader else {
            return 0;
        };
        let completed = loader.drain_completed();
        let count = completed.len();
        for loaded in completed {
            match loaded.result {
                Ok(template) => {
                    info!(
                        key = %loaded.key,
                        triangles = template.triangle_count(),
                        ms = loaded.load_time_ms,
                        "model loaded"
                    );
                    self.insert_model(&loaded.key, &template);
                }
                Err(source) => warn!(
                    "{}",
                    DioramaError::AssetLoadFailure {
                        asset: loaded.path.display().to_string(),
                        source,
                    }
                ),
            }
        }
        count
    }

    /// Place a loaded model by its loader key. Unknown keys are ignored.
    pub fn insert_model(&mut self, key: &str, template: &ModelTemplate) {
        match key {
            CASTLE_KEY => {
                if let Some(old) = self.handles.castle.take() {
                    self.scene.remove(old);
                }
                self.handles.castle = Some(place_castle(&mut self.scene, template));
            }
            CLIFF_KEY => {
                for old in self.handles.cliffs.drain(..) {
                    self.scene.remove(old);
                }
                self.handles.cliffs = place_cliffs(&mut self.scene, template, &self.cliff_sites);
            }
            other => warn!(key = other, "no placement for model"),
        }
    }

    /// Nudge the camera by one key press.
    pub fn on_key(&mut self, key: CameraKey) {
        self.camera.position += key.offset(self.key_step);
    }

    /// A click anywhere toggles the drawbridge.
    pub fn on_click(&mut self) -> Result<BridgeState, DioramaError> {
        self.bridge.toggle_in(&mut self.scene)
    }

    pub fn on_drag(&mut self, delta: Vec2, viewport_height: f32) {
        self.controls.rotate(delta, viewport_height);
    }

    pub fn on_scroll(&mut self, lines: f32) {
        self.controls.zoom(lines);
    }

    /// Match the camera to a new viewport. A degenerate size still applies
    /// the clamped ratio before reporting.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<(), DioramaError> {
        match viewport_aspect(width, height) {
            Ok(aspect) => {
                self.camera.set_aspect_ratio(aspect);
                Ok(())
            }
            Err(e) => {
                self.camera.set_aspect_ratio(clamped_aspect(&e));
                Err(e)
            }
        }
    }

    /// Swap ground and tree textures to another configured season and
    /// replant the trees. Missing textures drop their props.
    pub fn change_season(&mut self, season: &str) -> Result<(), DioramaError> {
        let (assets, _) = SeasonAssets::load(&self.scene_config, season)?;
        self.apply_season(assets);
        Ok(())
    }

    /// Apply already-loaded season textures.
    pub fn apply_season(&mut self, assets: SeasonAssets) {
        retexture_ground(
            &mut self.scene,
            &mut self.handles.ground,
            assets.foreground.clone(),
        );
        plant_trees(
            &mut self.scene,
            &mut self.handles.trees,
            assets.tree.clone(),
            tree_params(&self.scene_config),
            &mut self.rng,
        );
        info!(season = %assets.season, trees = self.handles.trees.len(), "season changed");
        self.season = assets.season;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn label(&self) -> &PhaseLabel {
        &self.label
    }

    pub fn bridge_state(&self) -> BridgeState {
        self.bridge.state()
    }

    pub fn handles(&self) -> &SceneHandles {
        &self.handles
    }

    pub fn cycle(&self) -> &DayNightCycle {
        &self.cycle
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cliff_sites(&self) -> &[Vec2] {
        &self.cliff_sites
    }

    /// Model loads still queued or running.
    pub fn pending_models(&self) -> u64 {
        self.loader
            .as_ref()
            .map_or(0, AsyncModelLoader::in_flight_count)
    }
}

fn tree_params(config: &SceneConfig) -> ScatterParams {
    ScatterParams {
        count: config.tree_count,
        exclusion_half_width: config.exclusion_half_width,
        bounds: config.scatter_bounds,
        max_attempts: config.max_scatter_attempts,
    }
}

fn clamped_aspect(err: &DioramaError) -> f32 {
    match err {
        DioramaError::DegenerateViewport { clamped, .. } => *clamped,
        _ => 1.0,
    }
}
