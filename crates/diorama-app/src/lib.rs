//! Desktop shell for the castle diorama.
//!
//! Opens the window, owns the GPU context and drives the diorama one frame
//! per redraw.

pub mod frame_clock;
pub mod platform;
pub mod window;

pub use frame_clock::FrameClock;
pub use platform::{PlatformDirs, PlatformError};
pub use window::{
    App, AppError, RoutedInput, route_input, run, window_attributes_from_config, window_title,
};
