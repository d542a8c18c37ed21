//! Mouse gestures the diorama reacts to: left-drag orbiting, wheel zoom and
//! left clicks.
//!
//! Events are folded into a [`MouseState`] as winit delivers them; the frame
//! loop reads the totals once and then calls
//! [`clear_transients`](MouseState::clear_transients).

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels of trackpad scroll treated as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Debug, Clone, Default)]
pub struct MouseState {
    /// Last cursor position, `None` while the cursor is outside the window.
    cursor: Option<Vec2>,
    left_held: bool,
    /// Cursor travel while the left button was held.
    drag: Vec2,
    wheel_lines: f32,
    clicks: u32,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if self.left_held
            && let Some(previous) = self.cursor
        {
            self.drag += position - previous;
        }
        self.cursor = Some(position);
    }

    /// A left press followed by a left release counts as one click, wherever
    /// the cursor went in between. Other buttons are ignored.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => self.left_held = true,
            ElementState::Released => {
                if self.left_held {
                    self.clicks += 1;
                }
                self.left_held = false;
            }
        }
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        self.wheel_lines += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
        };
    }

    /// The next move reports a position but no drag, since the cursor may
    /// have re-entered anywhere.
    pub fn on_cursor_entered(&mut self) {
        self.cursor = None;
    }

    /// Leaving the window ends any drag so the button cannot stick.
    pub fn on_cursor_left(&mut self) {
        self.cursor = None;
        self.left_held = false;
    }

    /// Zero the per-frame drag, wheel and click totals.
    pub fn clear_transients(&mut self) {
        self.drag = Vec2::ZERO;
        self.wheel_lines = 0.0;
        self.clicks = 0;
    }

    #[must_use]
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.left_held
    }

    /// Pixels dragged with the left button since the last clear.
    #[must_use]
    pub fn drag(&self) -> Vec2 {
        self.drag
    }

    /// Wheel lines since the last clear, positive away from the user.
    #[must_use]
    pub fn wheel_lines(&self) -> f32 {
        self.wheel_lines
    }

    /// Left clicks completed since the last clear.
    #[must_use]
    pub fn clicks(&self) -> u32 {
        self.clicks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(ms: &mut MouseState) {
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_button(MouseButton::Left, ElementState::Released);
    }

    #[test]
    fn test_hover_is_not_a_drag() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(100.0, 200.0);
        ms.on_cursor_moved(140.0, 180.0);
        assert_eq!(ms.cursor(), Some(Vec2::new(140.0, 180.0)));
        assert_eq!(ms.drag(), Vec2::ZERO);
    }

    #[test]
    fn test_drag_accumulates_until_clear() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(100.0, 200.0);
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_cursor_moved(105.0, 198.0);
        ms.on_cursor_moved(110.0, 195.0);
        assert!(ms.is_dragging());
        assert_eq!(ms.drag(), Vec2::new(10.0, -5.0));
        ms.clear_transients();
        assert_eq!(ms.drag(), Vec2::ZERO);
        assert!(ms.is_dragging());
    }

    #[test]
    fn test_clicks_count_until_clear() {
        let mut ms = MouseState::new();
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(ms.clicks(), 0);
        ms.on_button(MouseButton::Left, ElementState::Released);
        click(&mut ms);
        assert_eq!(ms.clicks(), 2);
        ms.clear_transients();
        assert_eq!(ms.clicks(), 0);
    }

    #[test]
    fn test_drag_then_release_still_clicks() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(0.0, 0.0);
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_cursor_moved(40.0, 0.0);
        ms.on_button(MouseButton::Left, ElementState::Released);
        assert_eq!(ms.clicks(), 1);
        assert!(!ms.is_dragging());
    }

    #[test]
    fn test_stray_release_and_other_buttons_ignored() {
        let mut ms = MouseState::new();
        ms.on_button(MouseButton::Left, ElementState::Released);
        ms.on_button(MouseButton::Right, ElementState::Pressed);
        ms.on_button(MouseButton::Right, ElementState::Released);
        assert_eq!(ms.clicks(), 0);
        assert!(!ms.is_dragging());
    }

    #[test]
    fn test_wheel_normalizes_pixels() {
        let mut ms = MouseState::new();
        ms.on_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        ms.on_scroll(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 20.0),
        ));
        assert!((ms.wheel_lines() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_leaving_window_ends_drag() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(10.0, 10.0);
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_cursor_left();
        assert_eq!(ms.cursor(), None);
        assert!(!ms.is_dragging());
        ms.on_button(MouseButton::Left, ElementState::Released);
        assert_eq!(ms.clicks(), 0);
    }

    #[test]
    fn test_reentry_does_not_jump() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(10.0, 10.0);
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_cursor_entered();
        ms.on_cursor_moved(500.0, 500.0);
        assert_eq!(ms.drag(), Vec2::ZERO);
    }
}
