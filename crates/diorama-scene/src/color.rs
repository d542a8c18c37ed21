//! Linear RGB colors built from sRGB hex literals.

/// A linear-space RGB color.
///
/// Hex values are authored in sRGB, so [`Color::from_hex`] decodes them; the
/// surface is an sRGB format and re-encodes on write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::linear(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::linear(0.0, 0.0, 0.0);

    /// Construct from components that are already linear.
    pub const fn linear(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decode a `0xRRGGBB` sRGB literal.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xFF) as f32 / 255.0);
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Scale every channel, e.g. by a light intensity.
    pub fn scaled(self, factor: f32) -> Self {
        Self::linear(self.r * factor, self.g * factor, self.b * factor)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_extremes() {
        assert_eq!(Color::from_hex(0xFFFFFF), Color::WHITE);
        assert_eq!(Color::from_hex(0x000000), Color::BLACK);
    }

    #[test]
    fn test_pure_blue_channels() {
        let c = Color::from_hex(0x0000FF);
        assert_eq!(c.r, 0.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_midtone_is_darker_in_linear() {
        // sRGB 0x80 is roughly 0.216 linear.
        let c = Color::from_hex(0x808080);
        assert!((c.r - 0.2158).abs() < 1e-3, "got {}", c.r);
    }
}
