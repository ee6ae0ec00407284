//! Session lifecycle state machine.
//!
//! ```text
//! Idle → Starting → Ready → Processing ⇄ Paused → Stopped
//!            └──→ Failed(VIDEO_FAIL | AR_FAIL)
//! ```
//! `Stopped` is reachable from every state.

use super::events::ArErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created, `start()` not called yet.
    #[default]
    Idle,
    /// Acquiring the camera and initializing the tracker.
    Starting,
    /// Surfaces attached and geometry computed; tracker not yet consuming.
    Ready,
    /// Tracker consuming frames.
    Processing,
    Paused,
    /// Terminal. A new session must be created.
    Stopped,
    /// Startup failed. Terminal, no retry.
    Failed(ArErrorCode),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed(_))
    }

    /// States in which surfaces are attached and geometry is meaningful.
    pub fn has_display(&self) -> bool {
        matches!(self, Self::Ready | Self::Processing | Self::Paused)
    }

    /// Pose updates still in the channel are applied in these states.
    pub fn accepts_pose_updates(&self) -> bool {
        self.has_display()
    }
}
