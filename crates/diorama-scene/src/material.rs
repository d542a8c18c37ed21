//! Surface appearance of mesh instances.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::color::Color;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique texture handle used by the renderer's texture cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Decoded RGBA8 image in sRGB space, row-major, top row first.
#[derive(Debug)]
pub struct ImageData {
    id: TextureId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    pub fn new(name: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            id: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            width,
            height,
            rgba,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }
}

/// How a material responds to scene lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Flat color, ignores lights.
    Unlit,
    /// Ambient plus Lambert diffuse from the directional light.
    Lit,
}

#[derive(Debug, Clone)]
pub struct Material {
    /// Base color, multiplied with the texture when one is set.
    pub color: Color,
    pub map: Option<Arc<ImageData>>,
    /// Only honoured when `transparent` is set.
    pub opacity: f32,
    /// Draw in the blended pass, sorted back to front.
    pub transparent: bool,
    /// Discard fragments whose alpha is below this value.
    pub alpha_test: f32,
    pub shading: Shading,
    /// Render back faces too.
    pub double_sided: bool,
}

impl Material {
    /// Unlit solid color.
    pub fn basic(color: Color) -> Self {
        Self {
            color,
            map: None,
            opacity: 1.0,
            transparent: false,
            alpha_test: 0.0,
            shading: Shading::Unlit,
            double_sided: false,
        }
    }

    /// Lambert-shaded solid color.
    pub fn lit(color: Color) -> Self {
        Self {
            shading: Shading::Lit,
            ..Self::basic(color)
        }
    }

    pub fn with_map(mut self, map: Arc<ImageData>) -> Self {
        self.map = Some(map);
        self
    }

    /// Mark as blended with the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.transparent = true;
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_alpha_test(mut self, threshold: f32) -> Self {
        self.alpha_test = threshold;
        self
    }

    pub fn with_double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    /// Opacity as the shader sees it.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent { self.opacity } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_ignores_opacity() {
        let mut m = Material::basic(Color::WHITE);
        m.opacity = 0.2;
        assert_eq!(m.effective_opacity(), 1.0);
    }

    #[test]
    fn test_with_opacity_marks_transparent() {
        let m = Material::basic(Color::from_hex(0x00008b)).with_opacity(0.8);
        assert!(m.transparent);
        assert_eq!(m.effective_opacity(), 0.8);
        assert_eq!(m.shading, Shading::Unlit);
    }

    #[test]
    fn test_lit_keeps_color() {
        let m = Material::lit(Color::from_hex(0x8b4513));
        assert_eq!(m.shading, Shading::Lit);
        assert_eq!(m.color, Color::from_hex(0x8b4513));
        assert!(!m.double_sided);
    }
}
