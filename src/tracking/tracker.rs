//! Tracker collaborator trait.

use anyhow::Result;
use crossbeam_channel::Sender;

use crate::anchor::TargetDimensions;
use crate::capture::InputHandle;
use crate::geometry::FrameSize;
use crate::system::messages::PoseUpdate;

/// Parameters handed to the tracker at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerCapabilities {
    /// Input frame size the tracker will be fed.
    pub input_size: FrameSize,
    /// Maximum number of targets tracked at the same time.
    pub max_track: usize,
}

/// External visual tracker.
///
/// `initialize`, `register_targets` and `warm_up` may block; the session
/// calls them from its startup worker without holding the session lock.
pub trait Tracker: Send {
    /// Prepare the tracker. Pose updates must be sent on `updates` in the
    /// order frames are processed.
    fn initialize(
        &mut self,
        caps: TrackerCapabilities,
        updates: Sender<PoseUpdate>,
    ) -> Result<()>;

    /// Load and register the compiled target set. Returns the dimensions of
    /// each target in registration order; index `i` is `TargetIndex(i)`.
    fn register_targets(&mut self, source: &str) -> Result<Vec<TargetDimensions>>;

    /// Run one inference pass to pay lazy initialization costs up front.
    fn warm_up(&mut self, input: &InputHandle) -> Result<()>;

    /// Start consuming frames from `input` on the tracker's own loop.
    fn begin_processing(&mut self, input: &InputHandle);

    /// Stop consuming frames.
    fn end_processing(&mut self);

    /// 16-element projection array (OpenGL convention).
    fn projection_matrix(&self) -> [f32; 16];
}
