//! Scene lights and their GPU-side packing.
//!
//! The diorama has exactly one ambient and one directional light. The
//! day/night cycle only ever changes the directional intensity.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::color::Color;

/// Uniform light reaching every lit surface.
#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Infinitely distant light shining from `position` toward `target`.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Color,
    pub intensity: f32,
}

impl DirectionalLight {
    /// Normalized direction the light travels in.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Color::WHITE,
                intensity: 0.5,
            },
            directional: DirectionalLight {
                position: Vec3::new(50.0, 50.0, 50.0),
                target: Vec3::ZERO,
                color: Color::WHITE,
                intensity: 1.0,
            },
        }
    }
}

impl Lights {
    pub fn to_uniform(&self) -> LightsUniform {
        let ambient = self.ambient.color.scaled(self.ambient.intensity);
        let dir = self.directional.direction();
        let dir_color = self.directional.color;
        LightsUniform {
            ambient: [ambient.r, ambient.g, ambient.b, 0.0],
            direction_intensity: [dir.x, dir.y, dir.z, self.directional.intensity],
            directional_color: [dir_color.r, dir_color.g, dir_color.b, 0.0],
        }
    }
}

/// GPU-side lights, 48 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    /// rgb = ambient color × intensity, w = padding.
    pub ambient: [f32; 4],
    /// xyz = travel direction (normalized), w = intensity.
    pub direction_intensity: [f32; 4],
    /// rgb = linear color, w = padding.
    pub directional_color: [f32; 4],
}
