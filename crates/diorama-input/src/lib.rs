//! Keyboard and mouse input for the diorama: camera nudge keys, orbit drag
//! and wheel, and click detection for the drawbridge.

pub mod keyboard;
pub mod mouse;

pub use keyboard::{CameraKey, KeyboardState, RawKeyEvent};
pub use mouse::MouseState;
