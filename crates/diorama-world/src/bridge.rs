//! Drawbridge toggle.
//!
//! Each click flips the bridge between lying flat and standing upright. The
//! recorded state picks the transition; the node's current X rotation must
//! still be exactly the angle that state implies, otherwise the click is
//! rejected and nothing moves.

use std::f32::consts::FRAC_PI_2;

use diorama_scene::{NodeId, Scene, Transform};

use crate::error::DioramaError;

/// X rotation of the bridge while lowered.
pub const LOWERED_ANGLE: f32 = 0.0;
/// X rotation of the bridge while raised.
pub const RAISED_ANGLE: f32 = FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Lowered,
    Raised,
}

impl BridgeState {
    /// The X rotation this state requires.
    pub fn angle(self) -> f32 {
        match self {
            BridgeState::Lowered => LOWERED_ANGLE,
            BridgeState::Raised => RAISED_ANGLE,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BridgeState::Lowered => BridgeState::Raised,
            BridgeState::Raised => BridgeState::Lowered,
        }
    }
}

/// The drawbridge node and its recorded state.
#[derive(Debug, Clone)]
pub struct Drawbridge {
    node: NodeId,
    state: BridgeState,
}

impl Drawbridge {
    /// Starts lowered.
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            state: BridgeState::Lowered,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Apply one click to `transform`. The snap is instantaneous.
    pub fn toggle(&mut self, transform: &mut Transform) -> Result<BridgeState, DioramaError> {
        let angle = transform.rotation.x;
        // Exact comparison: both angles are only ever assigned, never computed.
        if angle != self.state.angle() {
            return Err(DioramaError::InvalidTransition {
                from: self.state,
                angle,
            });
        }
        let next = self.state.toggled();
        transform.rotation.x = next.angle();
        self.state = next;
        tracing::debug!(state = ?next, "drawbridge toggled");
        Ok(next)
    }

    /// Toggle the bridge node inside `scene`.
    pub fn toggle_in(&mut self, scene: &mut Scene) -> Result<BridgeState, DioramaError> {
        let node = scene
            .get_mut(self.node)
            .ok_or(DioramaError::MissingNode("drawbridge"))?;
        self.toggle(&mut node.transform)
    }
}
