//! Render-side collaborators injected by the host.
//!
//! The session never creates scene objects or DOM elements itself. The host
//! hands over a [`RenderContext`] at construction: a render surface (the
//! canvas the scene is drawn into) and the display container both surfaces
//! live in.

use serde::{Deserialize, Serialize};

use crate::geometry::{DisplayLayout, FrameSize, PerspectiveCamera};

/// The two surfaces the session places in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// The video element showing the camera feed.
    Input,
    /// The canvas the overlay scene is rendered into.
    Render,
}

/// Renderer creation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub antialias: bool,
    /// Transparent clear color so the video shows through.
    pub alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub srgb_output: bool,
    /// Device pixel ratio applied to the drawing buffer.
    pub pixel_ratio: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            alpha: true,
            preserve_drawing_buffer: true,
            srgb_output: true,
            pixel_ratio: 1.0,
        }
    }
}

/// The host's renderer and the perspective camera it draws with.
pub trait RenderSurface: Send {
    fn configure(&mut self, settings: &RenderSettings);

    /// Resize the drawing buffer (not the on-screen layout).
    fn set_viewport(&mut self, size: FrameSize);

    /// Update the scene camera. Implementations recompute their projection.
    fn set_camera(&mut self, camera: &PerspectiveCamera);
}

/// Host element holding the input and render surfaces.
pub trait DisplayContainer: Send {
    /// Current client width and height in layout pixels.
    fn client_size(&self) -> (f64, f64);

    fn attach(&mut self, surface: SurfaceKind);

    fn detach(&mut self, surface: SurfaceKind);

    fn apply_layout(&mut self, surface: SurfaceKind, layout: &DisplayLayout);
}

/// Explicit rendering dependencies of a session.
pub struct RenderContext {
    pub surface: Box<dyn RenderSurface>,
    pub container: Box<dyn DisplayContainer>,
}

impl RenderContext {
    pub fn new(surface: Box<dyn RenderSurface>, container: Box<dyn DisplayContainer>) -> Self {
        Self { surface, container }
    }
}
