//! Recoverable runtime errors.
//!
//! None of these stop the frame loop: callers log them through `tracing`
//! and carry on.

use diorama_assets::AssetError;

use crate::bridge::BridgeState;

/// Smallest width/height ratio the camera accepts.
pub const MIN_ASPECT_RATIO: f32 = 0.01;
/// Largest width/height ratio the camera accepts.
pub const MAX_ASPECT_RATIO: f32 = 100.0;

#[derive(Debug, thiserror::Error)]
pub enum DioramaError {
    /// A texture or model failed to load; the prop is left out.
    #[error("asset `{asset}` failed to load: {source}")]
    AssetLoadFailure {
        asset: String,
        #[source]
        source: AssetError,
    },

    /// The drawbridge angle did not match its recorded state.
    #[error("drawbridge {from:?} but its x rotation is {angle}, ignoring click")]
    InvalidTransition { from: BridgeState, angle: f32 },

    /// The window reported a size with no usable aspect ratio.
    #[error("degenerate viewport {width}x{height}, aspect ratio clamped to {clamped}")]
    DegenerateViewport { width: u32, height: u32, clamped: f32 },

    /// A node the handlers rely on has been removed from the scene.
    #[error("scene node `{0}` is missing")]
    MissingNode(&'static str),

    /// A season was requested that the config does not define.
    #[error("season `{0}` is not configured")]
    UnknownSeason(String),
}

/// Aspect ratio for a viewport, clamped into
/// `[MIN_ASPECT_RATIO, MAX_ASPECT_RATIO]`. A zero-sized viewport yields
/// `DegenerateViewport` carrying the ratio to use instead.
pub fn viewport_aspect(width: u32, height: u32) -> Result<f32, DioramaError> {
    let raw = width as f32 / height as f32;
    let clamped = if raw.is_nan() {
        1.0
    } else {
        raw.clamp(MIN_ASPECT_RATIO, MAX_ASPECT_RATIO)
    };
    if clamped == raw {
        Ok(raw)
    } else {
        Err(DioramaError::DegenerateViewport {
            width,
            height,
            clamped,
        })
    }
}
