//! Geometry utilities: projection decomposition, letterbox layout and
//! anchor transforms. Everything here is pure.

pub mod letterbox;
pub mod projection;
pub mod transform;

use serde::{Deserialize, Serialize};

pub use letterbox::{DisplayLayout, letterbox};
pub use projection::{PerspectiveCamera, decompose_projection};
pub use transform::{display_transform, post_transform};

/// Native size of the input frames in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Everything derived from (projection, input size, container size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub camera: PerspectiveCamera,
    /// Drawing buffer size of the render surface (matches the input frames).
    pub viewport: FrameSize,
    /// Container-space rectangle shared by both surfaces.
    pub layout: DisplayLayout,
}

/// Recompute display geometry. Called at startup and on every resize.
pub fn compute_display_geometry(
    projection: &[f32; 16],
    input: FrameSize,
    container: (f64, f64),
) -> DisplayGeometry {
    let (container_width, container_height) = container;
    DisplayGeometry {
        camera: decompose_projection(projection, input),
        viewport: input,
        layout: letterbox(
            input.width as f64,
            input.height as f64,
            container_width,
            container_height,
        ),
    }
}
