//! Orbit camera controls.
//!
//! Dragging rotates the camera around a fixed target, the wheel moves it
//! closer or further, and with damping enabled pending rotation bleeds off
//! over several frames. The orbit is re-derived from the camera position on
//! every update, so direct position edits (the arrow keys) are picked up.

use std::f32::consts::{PI, TAU};

use diorama_config::CameraConfig;
use diorama_scene::Camera;
use glam::{Vec2, Vec3};

/// Keeps the polar angle off the poles, where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-6;
/// Closest the camera may sit to the target.
const MIN_RADIUS: f32 = 1e-4;
/// Wheel zoom factor per line at `zoom_speed = 1`.
const ZOOM_BASE: f32 = 0.95;
/// Pending rotation below this many radians is dropped.
const REST_THRESHOLD: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Pending (azimuth, polar) rotation in radians.
    pending: Vec2,
    /// Pending radius multiplier.
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitControls {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            target: Vec3::from(config.target),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            pending: Vec2::ZERO,
            scale: 1.0,
        }
    }

    /// Queue rotation for a cursor drag of `delta` pixels. A drag across the
    /// full viewport height turns the camera once around.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.pending.x -= TAU * delta.x / h * self.rotate_speed;
        self.pending.y -= TAU * delta.y / h * self.rotate_speed;
    }

    /// Queue zoom for `lines` wheel lines; positive moves toward the target.
    pub fn zoom(&mut self, lines: f32) {
        self.scale *= ZOOM_BASE.powf(self.zoom_speed * lines);
    }

    /// Whether rotation or zoom is still waiting to be applied.
    pub fn is_moving(&self) -> bool {
        self.pending.length() > REST_THRESHOLD || (self.scale - 1.0).abs() > f32::EPSILON
    }

    /// Apply pending motion to the camera and aim it at the target.
    /// Returns whether the camera position changed.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let (mut azimuth, mut polar) = if radius > MIN_RADIUS {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            radius = MIN_RADIUS;
            (0.0, PI * 0.5)
        };

        if self.enable_damping {
            azimuth += self.pending.x * self.damping_factor;
            polar += self.pending.y * self.damping_factor;
        } else {
            azimuth += self.pending.x;
            polar += self.pending.y;
        }
        polar = polar.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        radius = (radius * self.scale).clamp(self.min_distance.max(MIN_RADIUS), self.max_distance);

        let sin_polar = polar.sin();
        let new_offset = Vec3::new(
            radius * sin_polar * azimuth.sin(),
            radius * polar.cos(),
            radius * sin_polar * azimuth.cos(),
        );
        let new_position = self.target + new_offset;

        if self.enable_damping {
            self.pending *= 1.0 - self.damping_factor;
            if self.pending.length() <= REST_THRESHOLD {
                self.pending = Vec2::ZERO;
            }
        } else {
            self.pending = Vec2::ZERO;
        }
        self.scale = 1.0;

        let moved = new_position.distance_squared(camera.position) > 1e-8;
        camera.position = new_position;
        camera.target = self.target;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::default()
    }

    #[test]
    fn test_idle_update_keeps_position() {
        let mut controls = OrbitControls::default();
        let mut cam = camera();
        assert!(!controls.update(&mut cam));
        assert!((cam.position - Vec3::new(0.0, 20.0, 50.0)).length() < 1e-4);
        assert_eq!(cam.target, Vec3::ZERO);
    }

    #[test]
    fn test_rotation_preserves_radius() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut cam = camera();
        let radius = cam.position.length();
        controls.rotate(Vec2::new(120.0, 30.0), 720.0);
        assert!(controls.update(&mut cam));
        assert!((cam.position.length() - radius).abs() < 1e-3);
        assert!(!controls.is_moving());
    }

    #[test]
    fn test_damping_spreads_rotation_over_frames() {
        let mut controls = OrbitControls::default();
        let mut cam = camera();
        controls.rotate(Vec2::new(200.0, 0.0), 720.0);

        let start = cam.position;
        controls.update(&mut cam);
        let first_step = cam.position.distance(start);
        assert!(controls.is_moving());

        let before = cam.position;
        controls.update(&mut cam);
        let second_step = cam.position.distance(before);
        assert!(second_step < first_step, "{second_step} >= {first_step}");

        for _ in 0..2000 {
            controls.update(&mut cam);
        }
        assert!(!controls.is_moving());
    }

    #[test]
    fn test_zoom_in_moves_closer() {
        let mut controls = OrbitControls::default();
        let mut cam = camera();
        let before = cam.position.length();
        controls.zoom(1.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - before * 0.95).abs() < 1e-3);
    }

    #[test]
    fn test_keyboard_offset_is_respected() {
        // Arrow-key moves edit the position directly; the next update keeps it.
        let mut controls = OrbitControls::default();
        let mut cam = camera();
        cam.position += Vec3::new(2.0, 0.0, 0.0);
        controls.update(&mut cam);
        assert!((cam.position - Vec3::new(2.0, 20.0, 50.0)).length() < 1e-3);
    }

    #[test]
    fn test_polar_clamped_off_the_pole() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut cam = camera();
        controls.rotate(Vec2::new(0.0, 10_000.0), 720.0);
        controls.update(&mut cam);
        let forward = cam.forward();
        assert!(forward.is_finite());
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn test_camera_on_target_stays_finite() {
        let mut controls = OrbitControls::default();
        let mut cam = camera();
        cam.position = Vec3::ZERO;
        controls.update(&mut cam);
        assert!(cam.position.is_finite());
        assert!(cam.position.length() > 0.0);
        assert!(cam.view_matrix().is_finite());
    }
}
