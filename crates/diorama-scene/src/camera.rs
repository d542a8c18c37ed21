//! Perspective camera for the diorama.

use glam::{Mat4, Vec3};

/// Perspective camera looking from `position` toward `target`.
///
/// The projection is reverse-Z: the near plane maps to depth 1 and the far
/// plane to depth 0, so the depth test is `GreaterEqual`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 20.0, 50.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        // far and near swapped for reverse-Z
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Unit vector from the camera toward its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_scene_framing() {
        let camera = Camera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 20.0, 50.0));
        assert!((camera.fov_y.to_degrees() - 75.0).abs() < 1e-4);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_reverse_z_depth() {
        let camera = Camera {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            ..Camera::default()
        };
        let vp = camera.view_projection_matrix();
        let near = vp.project_point3(Vec3::new(0.0, 0.0, -0.1));
        let far = vp.project_point3(Vec3::new(0.0, 0.0, -1000.0));
        assert!((near.z - 1.0).abs() < 1e-4, "near depth {}", near.z);
        assert!(far.z.abs() < 1e-4, "far depth {}", far.z);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::default();
        let ndc = camera.view_projection_matrix().project_point3(camera.target);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }
}
