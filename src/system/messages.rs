//! Message types sent from the tracker to the session.
//!
//! The tracker runs its own frame loop and pushes one [`PoseUpdate`] per
//! target per processed frame over an unbounded channel. The session drains
//! the channel in emission order.

use crate::anchor::TargetIndex;

/// Pose estimate for one target from one processed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseUpdate {
    /// The target this estimate refers to.
    pub target_index: TargetIndex,

    /// World matrix of the target (column-major elements).
    /// `None` when the target is not detected in this frame.
    pub world_matrix: Option<[f32; 16]>,
}

impl PoseUpdate {
    /// Target detected with the given world matrix.
    pub fn found(target_index: TargetIndex, world_matrix: [f32; 16]) -> Self {
        Self {
            target_index,
            world_matrix: Some(world_matrix),
        }
    }

    /// Target not detected.
    pub fn lost(target_index: TargetIndex) -> Self {
        Self {
            target_index,
            world_matrix: None,
        }
    }

    pub fn is_detected(&self) -> bool {
        self.world_matrix.is_some()
    }
}
