//! One-time construction of the diorama's static props.
//!
//! Ground, river, drawbridge, sun, moon and lights are added immediately.
//! Trees are scattered around the castle with the season's texture. Cliff
//! sites are chosen up front so the layout depends only on the seed, while
//! the cliff and castle models themselves arrive later from the loader.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::path::Path;
use std::sync::Arc;

use diorama_assets::load_image;
use diorama_config::SceneConfig;
use diorama_scene::{
    Color, Geometry, ImageData, Lights, Material, ModelTemplate, Node, NodeId, Scene, Transform,
};
use glam::{Vec2, Vec3};
use rand::Rng;

use crate::error::DioramaError;
use crate::scatter::{ScatterParams, place_random_instances};

pub const GROUND_SIZE: f32 = 300.0;
pub const GROUND_Y: f32 = -25.0;

pub const TREE_WIDTH: f32 = 20.0;
pub const TREE_HEIGHT: f32 = 40.0;
pub const TREE_Y: f32 = -5.0;

pub const RIVER_INNER_RADIUS: f32 = 50.0;
pub const RIVER_OUTER_RADIUS: f32 = 60.0;
pub const RIVER_SEGMENTS: u32 = 32;
pub const RIVER_Y: f32 = -24.9;
pub const RIVER_COLOR: u32 = 0x00008B;
pub const RIVER_OPACITY: f32 = 0.8;

pub const BRIDGE_SIZE: Vec3 = Vec3::new(10.0, 1.0, 60.0);
pub const BRIDGE_POSITION: Vec3 = Vec3::new(0.0, -24.5, 55.0);
pub const BRIDGE_COLOR: u32 = 0x8B4513;

pub const CELESTIAL_RADIUS: f32 = 15.0;
pub const CELESTIAL_SEGMENTS: u32 = 32;
pub const CELESTIAL_POSITION: Vec3 = Vec3::new(0.0, 100.0, -150.0);
pub const SUN_COLOR: u32 = 0xFFFF00;
pub const MOON_COLOR: u32 = 0xAAAAAA;

pub const CLIFF_Y: f32 = -20.0;
pub const CLIFF_SCALE: f32 = 100.0;
pub const CASTLE_POSITION: Vec3 = Vec3::new(0.0, -25.0, 0.0);
pub const CASTLE_SCALE: f32 = 150.0;

/// Textures for one season. A texture that failed to load is `None` and
/// the prop using it is left out.
#[derive(Debug, Clone, Default)]
pub struct SeasonAssets {
    pub season: String,
    pub tree: Option<Arc<ImageData>>,
    pub foreground: Option<Arc<ImageData>>,
}

impl SeasonAssets {
    /// Load a configured season's textures. Individual texture failures are
    /// logged and returned alongside; an unknown season is an error.
    pub fn load(config: &SceneConfig, season: &str) -> Result<(Self, Vec<DioramaError>), DioramaError> {
        let textures = config
            .seasons
            .get(season)
            .ok_or_else(|| DioramaError::UnknownSeason(season.to_string()))?;

        let mut failures = Vec::new();
        let mut load = |relative: &Path| match load_image(&config.resolve(relative)) {
            Ok(image) => Some(image),
            Err(source) => {
                let err = DioramaError::AssetLoadFailure {
                    asset: relative.display().to_string(),
                    source,
                };
                tracing::warn!("{err}");
                failures.push(err);
                None
            }
        };
        let tree = load(&textures.tree);
        let foreground = load(&textures.foreground);

        Ok((
            Self {
                season: season.to_string(),
                tree,
                foreground,
            },
            failures,
        ))
    }
}

/// Nodes the runtime needs to reach after assembly.
#[derive(Debug, Clone)]
pub struct SceneHandles {
    pub ground: Option<NodeId>,
    pub river: NodeId,
    pub drawbridge: NodeId,
    pub sun: NodeId,
    pub moon: NodeId,
    pub trees: Vec<NodeId>,
    pub cliffs: Vec<NodeId>,
    pub castle: Option<NodeId>,
}

/// Add ground, river, drawbridge, sun, moon and lights.
pub fn assemble_static(scene: &mut Scene, assets: &SeasonAssets) -> SceneHandles {
    scene.lights = Lights::default();

    let ground = assets
        .foreground
        .as_ref()
        .map(|texture| add_ground(scene, Arc::clone(texture)));

    let river = scene.add(
        Node::mesh(
            "river",
            Arc::new(Geometry::ring(
                RIVER_INNER_RADIUS,
                RIVER_OUTER_RADIUS,
                RIVER_SEGMENTS,
            )),
            Material::basic(Color::from_hex(RIVER_COLOR))
                .with_opacity(RIVER_OPACITY)
                .with_double_sided(),
        )
        .with_transform(
            Transform::from_position(Vec3::new(0.0, RIVER_Y, 0.0))
                .with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        ),
    );

    let drawbridge = scene.add(
        Node::mesh(
            "drawbridge",
            Arc::new(Geometry::cuboid(BRIDGE_SIZE.x, BRIDGE_SIZE.y, BRIDGE_SIZE.z)),
            Material::basic(Color::from_hex(BRIDGE_COLOR)),
        )
        .with_transform(Transform::from_position(BRIDGE_POSITION)),
    );

    let sphere = Arc::new(Geometry::sphere(
        CELESTIAL_RADIUS,
        CELESTIAL_SEGMENTS,
        CELESTIAL_SEGMENTS,
    ));
    let sun = scene.add(
        Node::mesh(
            "sun",
            Arc::clone(&sphere),
            Material::basic(Color::from_hex(SUN_COLOR)),
        )
        .with_transform(Transform::from_position(CELESTIAL_POSITION)),
    );
    let moon = scene.add(
        Node::mesh("moon", sphere, Material::basic(Color::from_hex(MOON_COLOR)))
            .with_transform(Transform::from_position(CELESTIAL_POSITION)),
    );

    SceneHandles {
        ground,
        river,
        drawbridge,
        sun,
        moon,
        trees: Vec::new(),
        cliffs: Vec::new(),
        castle: None,
    }
}

fn ground_material(texture: Arc<ImageData>) -> Material {
    Material::basic(Color::WHITE).with_map(texture)
}

fn add_ground(scene: &mut Scene, texture: Arc<ImageData>) -> NodeId {
    scene.add(
        Node::mesh(
            "ground",
            Arc::new(Geometry::plane(GROUND_SIZE, GROUND_SIZE)),
            ground_material(texture),
        )
        .with_transform(
            Transform::from_position(Vec3::new(0.0, GROUND_Y, 0.0))
                .with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        ),
    )
}

/// Point the ground at a new texture, creating or removing the plane as
/// the texture appears or goes missing.
pub fn retexture_ground(
    scene: &mut Scene,
    ground: &mut Option<NodeId>,
    texture: Option<Arc<ImageData>>,
) {
    match (ground.as_ref().copied(), texture) {
        (Some(id), Some(texture)) => {
            if let Some(mesh) = scene.get_mut(id).and_then(|n| n.mesh.as_mut()) {
                mesh.material = ground_material(texture);
            }
        }
        (None, Some(texture)) => *ground = Some(add_ground(scene, texture)),
        (Some(id), None) => {
            scene.remove(id);
            *ground = None;
        }
        (None, None) => {}
    }
}

/// Replace every tree with a fresh scatter. Returns the number of trees
/// that needed the fallback placement.
pub fn plant_trees<R: Rng + ?Sized>(
    scene: &mut Scene,
    trees: &mut Vec<NodeId>,
    texture: Option<Arc<ImageData>>,
    params: ScatterParams,
    rng: &mut R,
) -> usize {
    for id in trees.drain(..) {
        scene.remove(id);
    }
    let Some(texture) = texture else {
        return 0;
    };

    let geometry = Arc::new(Geometry::plane(TREE_WIDTH, TREE_HEIGHT));
    let material = Material::basic(Color::WHITE)
        .with_map(texture)
        .with_opacity(1.0)
        .with_double_sided();
    let scatter = place_random_instances(rng, params);

    for point in &scatter.points {
        let yaw = rng.gen_range(0.0..TAU);
        let id = scene.add(
            Node::mesh("tree", Arc::clone(&geometry), material.clone()).with_transform(
                Transform::from_position(Vec3::new(point.x, TREE_Y, point.y))
                    .with_rotation(Vec3::new(0.0, yaw, 0.0)),
            ),
        );
        trees.push(id);
    }
    scatter.fallbacks
}

/// Clone the cliff model onto every site.
pub fn place_cliffs(scene: &mut Scene, template: &ModelTemplate, sites: &[Vec2]) -> Vec<NodeId> {
    sites
        .iter()
        .enumerate()
        .map(|(i, site)| {
            scene.instantiate(
                template,
                format!("cliff-{i}"),
                Transform::from_position(Vec3::new(site.x, CLIFF_Y, site.y))
                    .with_uniform_scale(CLIFF_SCALE),
            )
        })
        .collect()
}

pub fn place_castle(scene: &mut Scene, template: &ModelTemplate) -> NodeId {
    scene.instantiate(
        template,
        "castle",
        Transform::from_position(CASTLE_POSITION).with_uniform_scale(CASTLE_SCALE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use diorama_assets::solid_image;
    use diorama_scene::{ModelPart, Shading};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn assets() -> SeasonAssets {
        SeasonAssets {
            season: "summer".into(),
            tree: Some(solid_image("tree", [0, 128, 0, 255])),
            foreground: Some(solid_image("ground", [90, 160, 60, 255])),
        }
    }

    fn tree_params(count: usize) -> ScatterParams {
        ScatterParams {
            count,
            exclusion_half_width: 40.0,
            bounds: 150.0,
            max_attempts: 1000,
        }
    }

    #[test]
    fn test_static_props_placed() {
        let mut scene = Scene::new();
        let handles = assemble_static(&mut scene, &assets());
        assert_eq!(scene.len(), 5);

        let bridge = scene.get(handles.drawbridge).unwrap();
        assert_eq!(bridge.transform.position, BRIDGE_POSITION);
        assert_eq!(bridge.transform.rotation.x, 0.0);

        let river = scene.get(handles.river).unwrap();
        let material = &river.mesh.as_ref().unwrap().material;
        assert!(material.transparent && material.double_sided);
        assert_eq!(material.opacity, 0.8);

        let sun = scene.get(handles.sun).unwrap();
        let moon = scene.get(handles.moon).unwrap();
        assert_eq!(sun.transform.position, moon.transform.position);
        assert_eq!(scene.lights.ambient.intensity, 0.5);
        assert_eq!(scene.lights.directional.intensity, 1.0);
    }

    #[test]
    fn test_missing_ground_texture_skips_ground() {
        let mut scene = Scene::new();
        let handles = assemble_static(
            &mut scene,
            &SeasonAssets {
                foreground: None,
                ..assets()
            },
        );
        assert!(handles.ground.is_none());
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn test_trees_outside_castle_and_replanted() {
        let mut scene = Scene::new();
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let mut trees = Vec::new();
        let texture = assets().tree;

        plant_trees(&mut scene, &mut trees, texture.clone(), tree_params(40), &mut rng);
        assert_eq!(trees.len(), 40);
        for &id in &trees {
            let t = scene.get(id).unwrap().transform;
            assert_eq!(t.position.y, TREE_Y);
            assert!(t.position.x.abs().max(t.position.z.abs()) >= 40.0);
            assert!((0.0..TAU).contains(&t.rotation.y));
        }

        let first = trees.clone();
        plant_trees(&mut scene, &mut trees, texture, tree_params(40), &mut rng);
        assert_eq!(trees.len(), 40);
        assert_eq!(scene.len(), 40);
        assert!(first.iter().all(|id| !scene.contains(*id)));
    }

    #[test]
    fn test_trees_without_texture_removed() {
        let mut scene = Scene::new();
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let mut trees = Vec::new();
        plant_trees(&mut scene, &mut trees, assets().tree, tree_params(10), &mut rng);
        plant_trees(&mut scene, &mut trees, None, tree_params(10), &mut rng);
        assert!(trees.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_retexture_ground_transitions() {
        let mut scene = Scene::new();
        let mut ground = None;
        let texture = assets().foreground;

        retexture_ground(&mut scene, &mut ground, texture.clone());
        let id = ground.unwrap();
        retexture_ground(&mut scene, &mut ground, Some(solid_image("autumn", [1, 2, 3, 255])));
        assert_eq!(ground, Some(id));
        let map = scene.get(id).unwrap().mesh.as_ref().unwrap().material.map.clone();
        assert_eq!(map.unwrap().name, "autumn");

        retexture_ground(&mut scene, &mut ground, None);
        assert!(ground.is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_models_placed_at_fixed_transforms() {
        let template = ModelTemplate {
            name: "rock".into(),
            parts: vec![ModelPart {
                name: "rock.0".into(),
                geometry: Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)),
                material: Material::lit(Color::WHITE),
            }],
        };
        let mut scene = Scene::new();
        let sites = [Vec2::new(100.0, -60.0), Vec2::new(-45.0, 120.0)];
        let cliffs = place_cliffs(&mut scene, &template, &sites);
        assert_eq!(cliffs.len(), 2);
        let t = scene.get(cliffs[1]).unwrap().transform;
        assert_eq!(t.position, Vec3::new(-45.0, CLIFF_Y, 120.0));
        assert_eq!(t.scale, Vec3::splat(CLIFF_SCALE));

        let castle = place_castle(&mut scene, &template);
        let t = scene.get(castle).unwrap().transform;
        assert_eq!(t.position, CASTLE_POSITION);
        assert_eq!(t.scale, Vec3::splat(CASTLE_SCALE));

        let lit = scene
            .drawables()
            .iter()
            .all(|d| d.instance.material.shading == Shading::Lit);
        assert!(lit);
    }

    #[test]
    fn test_unknown_season_rejected() {
        let config = SceneConfig::default();
        assert!(matches!(
            SeasonAssets::load(&config, "winter"),
            Err(DioramaError::UnknownSeason(_))
        ));
    }

    #[test]
    fn test_missing_textures_reported() {
        let config = SceneConfig {
            asset_root: "/nonexistent".into(),
            ..SceneConfig::default()
        };
        let (assets, failures) = SeasonAssets::load(&config, "summer").unwrap();
        assert!(assets.tree.is_none() && assets.foreground.is_none());
        assert_eq!(failures.len(), 2);
        assert!(
            failures
                .iter()
                .all(|e| matches!(e, DioramaError::AssetLoadFailure { .. }))
        );
    }
}
