//! Camera capture: platform interfaces and the stream lifecycle manager.

pub mod device;
pub mod manager;

pub use device::{
    CaptureBackend, CaptureFault, FacingMode, InputHandle, StreamConstraints, VideoFrame,
    VideoStream,
};
pub use manager::{CaptureManager, CaptureState};
