//! Simulated collaborators: a synthetic camera, a scripted tracker and
//! headless surfaces. Used by the demo binary and the tests; hosts without
//! real hardware can use them to exercise a session end to end.

pub mod camera;
pub mod surface;
pub mod tracker;

pub use camera::{CameraProbe, SimulatedCamera};
pub use surface::{ContainerProbe, HeadlessSurface, RecordingContainer, SurfaceProbe};
pub use tracker::{ScriptedTracker, TrackerProbe, symmetric_projection};
