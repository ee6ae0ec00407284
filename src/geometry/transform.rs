//! Anchor transform helpers.

use nalgebra::{Matrix4, Vector3};

use crate::anchor::TargetDimensions;

/// Fixed transform mapping a unit template onto a target's footprint.
///
/// Translation `(w/2, w/2 + (h-w)/2, 0)` composed with a uniform scale of `w`
/// and no rotation, i.e. `T · S`.
pub fn post_transform(dims: TargetDimensions) -> Matrix4<f32> {
    let w = dims.width;
    let h = dims.height;
    let position = Vector3::new(w / 2.0, w / 2.0 + (h - w) / 2.0, 0.0);
    Matrix4::new_translation(&position) * Matrix4::new_scaling(w)
}

/// Interpret a tracker world matrix (column-major elements).
#[inline]
pub fn world_from_elements(elements: &[f32; 16]) -> Matrix4<f32> {
    Matrix4::from_column_slice(elements)
}

/// Display transform of an anchor: `world · post`.
pub fn display_transform(world: &[f32; 16], post: &Matrix4<f32>) -> Matrix4<f32> {
    world_from_elements(world) * post
}
