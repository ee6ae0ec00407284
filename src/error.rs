//! Error taxonomy for the AR session.
//!
//! Collaborators (tracker, capture backend, render surfaces) report failures
//! through `anyhow`; the session maps them onto [`SessionError`] at its
//! boundary so hosts can match on the category.

use thiserror::Error;

use crate::anchor::TargetIndex;
use crate::capture::CaptureState;
use crate::system::SessionState;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The platform offers no capture capability at all.
    #[error("video capture is not available on this platform")]
    CaptureUnavailable,

    /// The user or platform rejected the capture request.
    #[error("video capture permission denied: {0}")]
    CaptureDenied(String),

    /// Any other device failure while opening or reading the stream.
    #[error("video capture failed: {0}")]
    CaptureError(String),

    /// Tracker setup, target registration or warm-up failed.
    #[error("tracker initialization failed: {0:#}")]
    TrackerInitFailure(anyhow::Error),

    /// An anchor was requested for a target the tracker never registered.
    #[error("unknown target index {0}")]
    UnknownTarget(TargetIndex),

    /// Operation is not valid in the current lifecycle state.
    #[error("cannot {operation} while session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// A target was registered with a non-positive width or height.
    #[error("target {target_index} has degenerate dimensions {width}x{height}")]
    DegenerateTarget {
        target_index: TargetIndex,
        width: f32,
        height: f32,
    },

    /// Capture lifecycle misuse, e.g. resuming a stream that was released.
    #[error("cannot {operation} while capture is {state:?}")]
    CaptureInactive {
        operation: &'static str,
        state: CaptureState,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
