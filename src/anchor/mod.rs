//! Anchors: renderable placeholders that follow detected targets.

pub mod registry;
pub mod types;

pub use registry::{Anchor, AnchorHandle, AnchorPose, AnchorRegistry};
pub use types::{TargetDimensions, TargetIndex};
