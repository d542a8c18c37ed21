//! The castle diorama's behaviour: scene assembly, the day/night cycle, the
//! drawbridge toggle and camera control, gathered into [`Diorama`].
//!
//! Nothing here touches the GPU or the window; the app feeds input in and
//! reads the scene, camera and sky color back out each frame.

pub mod assembler;
pub mod bridge;
pub mod controls;
pub mod cycle;
pub mod error;
pub mod label;
pub mod scatter;
pub mod state;


pub use assembler::{SceneHandles, SeasonAssets};
pub use bridge::{BridgeState, Drawbridge};
pub use controls::OrbitControls;
pub use cycle::{CYCLE_LENGTH, CycleFrame, DayNightCycle, DayPhase};
pub use error::{DioramaError, viewport_aspect};
pub use label::PhaseLabel;
pub use scatter::{Scatter, ScatterParams, place_random_instances};
pub use state::{CASTLE_KEY, CLIFF_KEY, Diorama};
