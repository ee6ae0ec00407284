//! Aspect-preserving layout of the video and render surfaces inside the
//! host container.
//!
//! The surfaces always cover the whole container: the dimension that does
//! not fit overflows and is centered, so offsets can be negative.

use serde::{Deserialize, Serialize};

/// Layout rectangle in container pixels, applied identically to the input
/// surface and the render surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayLayout {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayLayout {
    /// CSS declarations for absolutely positioned web surfaces.
    pub fn css_declarations(&self) -> [(&'static str, String); 5] {
        [
            ("position", "absolute".to_string()),
            ("left", format!("{}px", self.left)),
            ("top", format!("{}px", self.top)),
            ("width", format!("{}px", self.width)),
            ("height", format!("{}px", self.height)),
        ]
    }
}

/// Compute the centered cover layout of an input of aspect
/// `input_width / input_height` inside a container.
pub fn letterbox(
    input_width: f64,
    input_height: f64,
    container_width: f64,
    container_height: f64,
) -> DisplayLayout {
    let input_ratio = input_width / input_height;
    let container_ratio = container_width / container_height;

    let (width, height) = if input_ratio > container_ratio {
        // Wider than the container: match heights, overflow horizontally.
        (container_height * input_ratio, container_height)
    } else {
        (container_width, container_width / input_ratio)
    };

    DisplayLayout {
        left: -(width - container_width) / 2.0,
        top: -(height - container_height) / 2.0,
        width,
        height,
    }
}
