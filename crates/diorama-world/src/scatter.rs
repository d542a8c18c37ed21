//! Random prop placement around the castle.
//!
//! Points are drawn uniformly from the square `[-bounds, bounds)²` and any
//! point strictly inside the central exclusion square is redrawn. Redraws
//! are capped; a prop that exhausts its attempts is pushed out onto the
//! exclusion edge instead. Bounds too large to sample are clamped, and a
//! square with no area sends every prop straight to the fallback.

use diorama_config::MAX_SCATTER_BOUNDS;
use glam::Vec2;
use rand::Rng;

/// Scatter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterParams {
    pub count: usize,
    /// Points with `max(|x|, |z|) < exclusion_half_width` are rejected.
    pub exclusion_half_width: f32,
    pub bounds: f32,
    /// Samples per point before the fallback kicks in. At least one is drawn.
    pub max_attempts: u32,
}

/// Placed points (x, z) and how many needed the fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scatter {
    pub points: Vec<Vec2>,
    pub fallbacks: usize,
}

/// Whether a point lies strictly inside the exclusion square.
pub fn in_exclusion_zone(point: Vec2, exclusion_half_width: f32) -> bool {
    point.x.abs() < exclusion_half_width && point.y.abs() < exclusion_half_width
}

/// Scatter `params.count` points outside the exclusion zone.
pub fn place_random_instances<R: Rng + ?Sized>(rng: &mut R, params: ScatterParams) -> Scatter {
    let ScatterParams {
        count,
        exclusion_half_width,
        bounds,
        max_attempts,
    } = params;

    // NaN fails this check; `min` alone would turn it into the maximum.
    let attempts = if bounds > 0.0 {
        max_attempts.max(1)
    } else {
        tracing::warn!(bounds, "scatter square has no area");
        0
    };
    let bounds = bounds.min(MAX_SCATTER_BOUNDS);

    let mut scatter = Scatter {
        points: Vec::with_capacity(count),
        fallbacks: 0,
    };

    for _ in 0..count {
        let mut sample = Vec2::ZERO;
        let mut placed = false;
        for _ in 0..attempts {
            sample = Vec2::new(
                rng.gen_range(-bounds..bounds),
                rng.gen_range(-bounds..bounds),
            );
            if !in_exclusion_zone(sample, exclusion_half_width) {
                placed = true;
                break;
            }
        }
        if !placed {
            sample = push_to_exclusion_edge(sample, exclusion_half_width);
            scatter.fallbacks += 1;
        }
        scatter.points.push(sample);
    }

    if scatter.fallbacks > 0 {
        tracing::warn!(
            fallbacks = scatter.fallbacks,
            count,
            max_attempts,
            "scatter ran out of attempts, props moved to the exclusion edge"
        );
    }
    scatter
}

/// Move a point along its dominant axis until it sits on the exclusion edge.
fn push_to_exclusion_edge(point: Vec2, exclusion_half_width: f32) -> Vec2 {
    let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
    if point.x.abs() >= point.y.abs() {
        Vec2::new(sign(point.x) * exclusion_half_width, point.y)
    } else {
        Vec2::new(point.x, sign(point.y) * exclusion_half_width)
    }
}
