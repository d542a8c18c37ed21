//! Loaded model templates that can be instanced into the scene many times.

use std::sync::Arc;

use crate::geometry::Geometry;
use crate::material::Material;

/// One drawable piece of a model, with its node transform already baked
/// into the vertices.
#[derive(Debug, Clone)]
pub struct ModelPart {
    pub name: String,
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

/// A model ready to be cloned into the scene. Instances share geometry
/// and textures; only the node hierarchy is duplicated.
#[derive(Debug, Clone)]
pub struct ModelTemplate {
    pub name: String,
    pub parts: Vec<ModelPart>,
}

impl ModelTemplate {
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.geometry.triangle_count()).sum()
    }
}
