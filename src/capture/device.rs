//! Platform capture interfaces.
//!
//! The host provides a [`CaptureBackend`] (camera permission + device
//! selection) which opens [`VideoStream`]s. Everything here is a seam: the
//! crate never talks to hardware directly.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::FrameSize;

/// Which camera to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// Constraints passed to the backend when opening a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing_mode: FacingMode,
    pub audio: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            audio: false,
        }
    }
}

/// Why a backend could not open a stream.
#[derive(Debug, Error)]
pub enum CaptureFault {
    #[error("permission denied: {0}")]
    Denied(String),
    #[error("device error: {0}")]
    Device(String),
}

/// One RGBA frame read from the stream.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub size: FrameSize,
    /// Milliseconds since the stream started.
    pub timestamp_ms: f64,
    /// Tightly packed RGBA pixels, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

/// A live camera stream.
pub trait VideoStream: Send {
    /// Block until the stream metadata is loaded and return the native
    /// frame size. Called exactly once per stream.
    fn wait_for_metadata(&mut self) -> anyhow::Result<FrameSize>;

    /// Start or restart frame delivery.
    fn play(&mut self) -> anyhow::Result<()>;

    /// Halt the capture element. Hardware tracks stay open.
    fn pause(&mut self);

    /// Stop every hardware track. The stream is unusable afterwards.
    fn stop_tracks(&mut self);

    /// Latest frame, if one is available.
    fn read_frame(&mut self) -> Option<VideoFrame>;
}

/// Platform capture capability.
pub trait CaptureBackend: Send + Sync {
    /// Whether the platform exposes any capture API at all.
    fn is_available(&self) -> bool;

    /// Request a stream. May block while the user answers a permission prompt.
    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureFault>;
}

/// Shared handle to the live input, passed to the tracker.
#[derive(Clone)]
pub struct InputHandle {
    stream: Arc<Mutex<Box<dyn VideoStream>>>,
    size: FrameSize,
}

impl InputHandle {
    pub fn new(stream: Box<dyn VideoStream>, size: FrameSize) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
            size,
        }
    }

    /// Native frame size reported by the stream metadata.
    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn read_frame(&self) -> Option<VideoFrame> {
        self.stream.lock().read_frame()
    }

    pub(crate) fn play(&self) -> anyhow::Result<()> {
        self.stream.lock().play()
    }

    pub(crate) fn pause(&self) {
        self.stream.lock().pause();
    }

    pub(crate) fn stop_tracks(&self) {
        self.stream.lock().stop_tracks();
    }
}

impl std::fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandle")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
