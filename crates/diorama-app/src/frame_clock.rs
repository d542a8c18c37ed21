//! Wall-clock frame timing: clamped frame time, smoothed FPS, frame count.
//!
//! The cycle itself advances per frame, not per second; this clock only
//! feeds the stats log and the window title.

use std::time::Instant;
use tracing::warn;

/// Longest frame the clock will report, in seconds.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Weight of the newest sample in the frame-time average.
const EMA_ALPHA: f64 = 0.1;

pub struct FrameClock {
    previous: Instant,
    frame_count: u64,
    frame_time_ema: f64,
    last_frame_time: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            previous: Instant::now(),
            frame_count: 0,
            frame_time_ema: 1.0 / 60.0,
            last_frame_time: 0.0,
        }
    }

    /// Mark the end of a frame. Returns the clamped frame time in seconds.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.record(elapsed)
    }

    fn record(&mut self, elapsed: f64) -> f64 {
        let dt = if elapsed > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                elapsed * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            MAX_FRAME_TIME
        } else {
            elapsed.max(0.0)
        };
        if dt > 0.0 {
            self.frame_time_ema = self.frame_time_ema * (1.0 - EMA_ALPHA) + dt * EMA_ALPHA;
        }
        self.last_frame_time = dt;
        self.frame_count += 1;
        dt
    }

    /// Smoothed frames per second.
    pub fn fps(&self) -> f64 {
        1.0 / self.frame_time_ema
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_frame_time(&self) -> f64 {
        self.last_frame_time
    }

    /// True on every `interval`-th frame. Zero disables reporting.
    pub fn should_report(&self, interval: u64) -> bool {
        interval > 0 && self.frame_count > 0 && self.frame_count.is_multiple_of(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_frames_converge_to_rate() {
        let mut clock = FrameClock::new();
        for _ in 0..500 {
            clock.record(1.0 / 30.0);
        }
        assert!((clock.fps() - 30.0).abs() < 0.1, "fps = {}", clock.fps());
        assert_eq!(clock.frame_count(), 500);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.record(2.0), MAX_FRAME_TIME);
        assert_eq!(clock.last_frame_time(), MAX_FRAME_TIME);
        assert!(clock.fps() >= 1.0 / MAX_FRAME_TIME);
    }

    #[test]
    fn test_zero_frame_time_keeps_average() {
        let mut clock = FrameClock::new();
        let before = clock.fps();
        clock.record(0.0);
        assert_eq!(clock.fps(), before);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_report_interval() {
        let mut clock = FrameClock::new();
        assert!(!clock.should_report(120));
        let mut reports = 0;
        for _ in 0..360 {
            clock.record(0.016);
            if clock.should_report(120) {
                reports += 1;
            }
        }
        assert_eq!(reports, 3);
        assert!(!clock.should_report(0));
    }
}
