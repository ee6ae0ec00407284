//! Core ID and dimension types for trackable targets.

use serde::{Deserialize, Serialize};

/// Index of a registered target.
///
/// Indices are assigned by the tracker in registration order and are used
/// as lightweight handles between pose updates, anchors and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetIndex(pub usize);

impl TargetIndex {
    /// Create a new TargetIndex with the given value.
    pub fn new(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for TargetIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Physical footprint of a registered target, in the tracker's units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetDimensions {
    pub width: f32,
    pub height: f32,
}

impl TargetDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl From<(f32, f32)> for TargetDimensions {
    fn from((width, height): (f32, f32)) -> Self {
        Self { width, height }
    }
}
