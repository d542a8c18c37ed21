//! Day/night cycle: a cyclic time-of-day in `[0, 6)` split into six
//! discrete phases.
//!
//! Every rendered frame advances the time by a fixed step. Sky color, light
//! intensity and which celestial body is shown are stepwise lookups, never
//! interpolated. The sun is up on `[1, 4)` and the moon on `[5, 6) ∪ [0, 1)`,
//! so during Dusk (`[4, 5)`) neither is drawn.

use diorama_config::{ConfigError, CycleConfig};
use diorama_scene::Color;

/// Time-of-day units in one full cycle.
pub const CYCLE_LENGTH: f64 = 6.0;

/// One of the six phases of the cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayPhase {
    Dawn,
    Morning,
    Noon,
    Afternoon,
    Dusk,
    Night,
}

impl DayPhase {
    pub const ALL: [DayPhase; 6] = [
        DayPhase::Dawn,
        DayPhase::Morning,
        DayPhase::Noon,
        DayPhase::Afternoon,
        DayPhase::Dusk,
        DayPhase::Night,
    ];

    /// Phase for a time of day: `floor(t)`, with out-of-range input wrapped
    /// into `[0, 6)` first.
    pub fn from_time(time_of_day: f64) -> Self {
        let t = time_of_day.rem_euclid(CYCLE_LENGTH);
        let index = (t.floor() as usize).min(5);
        Self::ALL[index]
    }

    pub fn index(self) -> usize {
        match self {
            DayPhase::Dawn => 0,
            DayPhase::Morning => 1,
            DayPhase::Noon => 2,
            DayPhase::Afternoon => 3,
            DayPhase::Dusk => 4,
            DayPhase::Night => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DayPhase::Dawn => "Dawn",
            DayPhase::Morning => "Morning",
            DayPhase::Noon => "Noon",
            DayPhase::Afternoon => "Afternoon",
            DayPhase::Dusk => "Dusk",
            DayPhase::Night => "Night",
        }
    }

    /// Sky color as an sRGB hex literal.
    pub fn sky_hex(self) -> u32 {
        match self {
            DayPhase::Dawn => 0xFFCC99,
            DayPhase::Morning => 0x87CEEB,
            DayPhase::Noon => 0x0000FF,
            DayPhase::Afternoon => 0x87CEFA,
            DayPhase::Dusk => 0xFF4500,
            DayPhase::Night => 0x000022,
        }
    }

    pub fn sky_color(self) -> Color {
        Color::from_hex(self.sky_hex())
    }

    /// Directional light intensity during this phase.
    pub fn light_intensity(self) -> f32 {
        match self {
            DayPhase::Night | DayPhase::Dawn => 0.1,
            DayPhase::Dusk => 0.3,
            DayPhase::Morning | DayPhase::Noon | DayPhase::Afternoon => 1.0,
        }
    }
}

impl std::fmt::Display for DayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sun is shown on `[1, 4)`.
pub fn sun_visible(time_of_day: f64) -> bool {
    (1.0..4.0).contains(&time_of_day)
}

/// Moon is shown on `[5, 6) ∪ [0, 1)`.
pub fn moon_visible(time_of_day: f64) -> bool {
    time_of_day >= 5.0 || time_of_day < 1.0
}

/// Everything derived from one advance of the cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleFrame {
    pub time_of_day: f64,
    pub phase: DayPhase,
    pub sky_color: Color,
    pub sun_visible: bool,
    pub moon_visible: bool,
    pub light_intensity: f32,
}

impl CycleFrame {
    pub fn at(time_of_day: f64) -> Self {
        let phase = DayPhase::from_time(time_of_day);
        Self {
            time_of_day,
            phase,
            sky_color: phase.sky_color(),
            sun_visible: sun_visible(time_of_day),
            moon_visible: moon_visible(time_of_day),
            light_intensity: phase.light_intensity(),
        }
    }
}

/// The cycle controller.
///
/// Time is derived from a frame counter rather than accumulated, so after
/// `n` advances it is exactly `(start + n·step) mod 6` with no drift.
#[derive(Debug, Clone)]
pub struct DayNightCycle {
    start: f64,
    step: f64,
    frames: u64,
    time_of_day: f64,
}

impl DayNightCycle {
    /// `step` must be positive and finite; `start` is wrapped into `[0, 6)`.
    pub fn new(start: f64, step: f64) -> Result<Self, ConfigError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "cycle.step",
                reason: format!("must be a positive finite number, got {step}"),
            });
        }
        if !start.is_finite() {
            return Err(ConfigError::Invalid {
                field: "cycle.start_time",
                reason: format!("must be finite, got {start}"),
            });
        }
        let start = start.rem_euclid(CYCLE_LENGTH);
        Ok(Self {
            start,
            step,
            frames: 0,
            time_of_day: start,
        })
    }

    pub fn from_config(config: &CycleConfig) -> Result<Self, ConfigError> {
        Self::new(config.start_time, config.step)
    }

    /// Step the cycle by one frame and return the derived state.
    pub fn advance(&mut self) -> CycleFrame {
        self.frames = self.frames.wrapping_add(1);
        let mut t = (self.start + self.frames as f64 * self.step).rem_euclid(CYCLE_LENGTH);
        // rem_euclid can round up to exactly 6.0 for inputs just below a multiple of 6.
        if t >= CYCLE_LENGTH {
            t = 0.0;
        }
        self.time_of_day = t;
        CycleFrame::at(t)
    }

    /// State at the current time without advancing.
    pub fn current(&self) -> CycleFrame {
        CycleFrame::at(self.time_of_day)
    }

    pub fn time_of_day(&self) -> f64 {
        self.time_of_day
    }

    pub fn phase(&self) -> DayPhase {
        DayPhase::from_time(self.time_of_day)
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of advances since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_stays_in_range() {
        let mut cycle = DayNightCycle::new(5.5, 0.37).unwrap();
        for _ in 0..10_000 {
            let frame = cycle.advance();
            assert!(
                (0.0..CYCLE_LENGTH).contains(&frame.time_of_day),
                "time out of range: {}",
                frame.time_of_day
            );
            assert!(frame.phase.index() <= 5);
            assert_eq!(frame.phase.index(), frame.time_of_day.floor() as usize);
        }
    }

    #[test]
    fn test_time_matches_closed_form() {
        let (t0, s) = (2.25, 0.013);
        let mut cycle = DayNightCycle::new(t0, s).unwrap();
        for n in 1..=5000u64 {
            let frame = cycle.advance();
            let expected = (t0 + n as f64 * s).rem_euclid(6.0);
            assert!(
                (frame.time_of_day - expected).abs() < 1e-9,
                "n={n}: {} vs {expected}",
                frame.time_of_day
            );
        }
        assert_eq!(cycle.frames(), 5000);
    }

    #[test]
    fn test_first_advance_from_zero() {
        let mut cycle = DayNightCycle::new(0.0, 0.01).unwrap();
        let frame = cycle.advance();
        assert!((frame.time_of_day - 0.01).abs() < 1e-12);
        assert_eq!(frame.phase, DayPhase::Dawn);
        assert!(frame.moon_visible);
        assert!(!frame.sun_visible);
        assert_eq!(frame.light_intensity, 0.1);
        assert_eq!(frame.sky_color, Color::from_hex(0xFFCC99));
    }

    #[test]
    fn test_phase_is_floor() {
        let cases = [
            (0.0, DayPhase::Dawn),
            (0.999, DayPhase::Dawn),
            (1.0, DayPhase::Morning),
            (2.5, DayPhase::Noon),
            (3.0, DayPhase::Afternoon),
            (4.2, DayPhase::Dusk),
            (5.99, DayPhase::Night),
            (6.0, DayPhase::Dawn),
            (-0.5, DayPhase::Night),
        ];
        for (t, phase) in cases {
            assert_eq!(DayPhase::from_time(t), phase, "t={t}");
        }
    }

    #[test]
    fn test_visibility_boundaries() {
        assert!(!sun_visible(0.999));
        assert!(sun_visible(1.0));
        assert!(sun_visible(3.999));
        assert!(!sun_visible(4.0));

        assert!(moon_visible(0.0));
        assert!(moon_visible(0.999));
        assert!(!moon_visible(1.0));
        assert!(!moon_visible(4.999));
        assert!(moon_visible(5.0));
        assert!(moon_visible(5.999));
    }

    #[test]
    fn test_dusk_shows_neither_body() {
        for i in 0..100 {
            let t = 4.0 + i as f64 * 0.01;
            let frame = CycleFrame::at(t);
            assert_eq!(frame.phase, DayPhase::Dusk);
            assert!(!frame.sun_visible && !frame.moon_visible, "t={t}");
        }
    }

    #[test]
    fn test_never_both_visible() {
        for i in 0..600 {
            let frame = CycleFrame::at(i as f64 * 0.01);
            assert!(!(frame.sun_visible && frame.moon_visible));
            let neither = !frame.sun_visible && !frame.moon_visible;
            assert_eq!(neither, frame.phase == DayPhase::Dusk);
        }
    }

    #[test]
    fn test_intensity_table() {
        let expected = [0.1, 1.0, 1.0, 1.0, 0.3, 0.1];
        for (phase, want) in DayPhase::ALL.into_iter().zip(expected) {
            assert_eq!(phase.light_intensity(), want, "{phase}");
        }
    }

    #[test]
    fn test_sky_table() {
        let expected = [0xFFCC99, 0x87CEEB, 0x0000FF, 0x87CEFA, 0xFF4500, 0x000022];
        for (phase, want) in DayPhase::ALL.into_iter().zip(expected) {
            assert_eq!(phase.sky_hex(), want, "{phase}");
        }
    }

    #[test]
    fn test_index_round_trips_through_all() {
        for (i, phase) in DayPhase::ALL.into_iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn test_rejects_bad_step() {
        assert!(DayNightCycle::new(0.0, 0.0).is_err());
        assert!(DayNightCycle::new(0.0, -0.01).is_err());
        assert!(DayNightCycle::new(0.0, f64::INFINITY).is_err());
        assert!(DayNightCycle::new(f64::NAN, 0.01).is_err());
    }

    #[test]
    fn test_start_is_wrapped() {
        let cycle = DayNightCycle::new(7.5, 0.01).unwrap();
        assert!((cycle.time_of_day() - 1.5).abs() < 1e-12);
        assert_eq!(cycle.phase(), DayPhase::Morning);
        assert_eq!(cycle.current().phase, DayPhase::Morning);
    }
}
