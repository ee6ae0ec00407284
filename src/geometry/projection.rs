//! Decomposition of the tracker's projection matrix into perspective camera
//! parameters.
//!
//! The tracker publishes a 16-element OpenGL-style projection array. For a
//! symmetric frustum the relevant entries are:
//!
//! ```text
//! m[5]  = 1 / tan(fovy / 2)
//! m[10] = -(far + near) / (far - near)
//! m[14] = -2 · far · near / (far - near)
//! ```

use nalgebra::{Matrix4, Perspective3};
use serde::{Deserialize, Serialize};

use super::FrameSize;

/// Perspective camera model fed to the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Width / height of the input frames.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    /// Projection matrix equivalent to the camera parameters.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect, self.fov_deg.to_radians(), self.near, self.far)
            .to_homogeneous()
    }
}

/// Recover the vertical field of view (degrees) from `m[5]`.
#[inline]
pub fn vertical_fov_deg(m: &[f32; 16]) -> f32 {
    (2.0 * (1.0 / m[5]).atan()).to_degrees()
}

/// Recover the near plane distance.
#[inline]
pub fn near_plane(m: &[f32; 16]) -> f32 {
    m[14] / (m[10] - 1.0)
}

/// Recover the far plane distance.
#[inline]
pub fn far_plane(m: &[f32; 16]) -> f32 {
    m[14] / (m[10] + 1.0)
}

/// Build the perspective camera for a given projection and input size.
pub fn decompose_projection(m: &[f32; 16], input: FrameSize) -> PerspectiveCamera {
    PerspectiveCamera {
        fov_deg: vertical_fov_deg(m),
        aspect: input.aspect() as f32,
        near: near_plane(m),
        far: far_plane(m),
    }
}
