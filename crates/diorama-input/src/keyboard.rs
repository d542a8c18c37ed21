//! Camera nudge keys.
//!
//! Keys are matched on their logical value, so `+` is recognised whether it
//! comes from the main row with shift or from the numpad. Every keydown,
//! including OS auto-repeat, yields one nudge.

use glam::Vec3;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key, NamedKey};

/// A key that moves the camera one step along a world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Plus,
    Minus,
}

impl CameraKey {
    /// Map a logical key, or `None` for keys that do nothing.
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::ArrowUp) => Some(CameraKey::ArrowUp),
            Key::Named(NamedKey::ArrowDown) => Some(CameraKey::ArrowDown),
            Key::Named(NamedKey::ArrowLeft) => Some(CameraKey::ArrowLeft),
            Key::Named(NamedKey::ArrowRight) => Some(CameraKey::ArrowRight),
            Key::Character(c) if c.as_str() == "+" => Some(CameraKey::Plus),
            Key::Character(c) if c.as_str() == "-" => Some(CameraKey::Minus),
            _ => None,
        }
    }

    /// World-space translation for one keydown.
    ///
    /// Up/down arrows move along Z (up is toward -Z), left/right along X.
    /// `+` lowers the camera and `-` raises it.
    pub fn offset(self, step: f32) -> Vec3 {
        match self {
            CameraKey::ArrowUp => Vec3::new(0.0, 0.0, -step),
            CameraKey::ArrowDown => Vec3::new(0.0, 0.0, step),
            CameraKey::ArrowLeft => Vec3::new(-step, 0.0, 0.0),
            CameraKey::ArrowRight => Vec3::new(step, 0.0, 0.0),
            CameraKey::Plus => Vec3::new(0.0, -step, 0.0),
            CameraKey::Minus => Vec3::new(0.0, step, 0.0),
        }
    }
}

/// Minimal description of a key event, constructible in tests.
#[derive(Debug, Clone)]
pub struct RawKeyEvent {
    pub key: Key,
    pub state: ElementState,
    pub repeat: bool,
}

/// Collects camera key presses between frames.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pending: Vec<CameraKey>,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &KeyEvent) {
        self.process_raw(RawKeyEvent {
            key: event.logical_key.clone(),
            state: event.state,
            repeat: event.repeat,
        });
    }

    /// Queue a nudge for every keydown of a camera key. Releases and other
    /// keys are dropped.
    pub fn process_raw(&mut self, event: RawKeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        match CameraKey::from_key(&event.key) {
            Some(key) => self.pending.push(key),
            None => tracing::trace!(key = ?event.key, "ignored key"),
        }
    }

    /// Keys pressed since the last drain, in arrival order.
    pub fn drain(&mut self) -> Vec<CameraKey> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(key: Key, repeat: bool) -> RawKeyEvent {
        RawKeyEvent {
            key,
            state: ElementState::Pressed,
            repeat,
        }
    }

    fn ch(s: &str) -> Key {
        Key::Character(s.into())
    }

    #[test]
    fn test_arrow_and_sign_keys_map() {
        assert_eq!(
            CameraKey::from_key(&Key::Named(NamedKey::ArrowUp)),
            Some(CameraKey::ArrowUp)
        );
        assert_eq!(CameraKey::from_key(&ch("+")), Some(CameraKey::Plus));
        assert_eq!(CameraKey::from_key(&ch("-")), Some(CameraKey::Minus));
        assert_eq!(CameraKey::from_key(&ch("w")), None);
        assert_eq!(CameraKey::from_key(&ch("=")), None);
        assert_eq!(CameraKey::from_key(&Key::Named(NamedKey::Space)), None);
    }

    #[test]
    fn test_offsets_match_axis_table() {
        let step = 2.0;
        assert_eq!(CameraKey::ArrowUp.offset(step), Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(CameraKey::ArrowDown.offset(step), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(CameraKey::ArrowLeft.offset(step), Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(CameraKey::ArrowRight.offset(step), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(CameraKey::Plus.offset(step), Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(CameraKey::Minus.offset(step), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let pairs = [
            (CameraKey::ArrowUp, CameraKey::ArrowDown),
            (CameraKey::ArrowLeft, CameraKey::ArrowRight),
            (CameraKey::Plus, CameraKey::Minus),
        ];
        for (a, b) in pairs {
            assert_eq!(a.offset(2.0) + b.offset(2.0), Vec3::ZERO);
        }
    }

    #[test]
    fn test_repeat_counts_as_another_step() {
        let mut kb = KeyboardState::new();
        kb.process_raw(down(Key::Named(NamedKey::ArrowLeft), false));
        kb.process_raw(down(Key::Named(NamedKey::ArrowLeft), true));
        kb.process_raw(down(Key::Named(NamedKey::ArrowLeft), true));
        assert_eq!(kb.drain(), vec![CameraKey::ArrowLeft; 3]);
    }

    #[test]
    fn test_release_and_other_keys_ignored() {
        let mut kb = KeyboardState::new();
        kb.process_raw(RawKeyEvent {
            key: Key::Named(NamedKey::ArrowUp),
            state: ElementState::Released,
            repeat: false,
        });
        kb.process_raw(down(ch("a"), false));
        kb.process_raw(down(Key::Named(NamedKey::Enter), false));
        assert_eq!(kb.pending_len(), 0);
    }

    #[test]
    fn test_drain_empties_queue_in_order() {
        let mut kb = KeyboardState::new();
        kb.process_raw(down(ch("+"), false));
        kb.process_raw(down(Key::Named(NamedKey::ArrowRight), false));
        assert_eq!(kb.drain(), vec![CameraKey::Plus, CameraKey::ArrowRight]);
        assert!(kb.drain().is_empty());
    }
}
