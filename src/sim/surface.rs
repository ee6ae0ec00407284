//! Headless render surface and recording display container.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::geometry::{DisplayLayout, FrameSize, PerspectiveCamera};
use crate::render::{DisplayContainer, RenderSettings, RenderSurface, SurfaceKind};

#[derive(Debug, Default)]
pub struct SurfaceProbe {
    settings: Mutex<Option<RenderSettings>>,
    viewport: Mutex<Option<FrameSize>>,
    camera: Mutex<Option<PerspectiveCamera>>,
}

impl SurfaceProbe {
    pub fn settings(&self) -> Option<RenderSettings> {
        *self.settings.lock()
    }

    pub fn viewport(&self) -> Option<FrameSize> {
        *self.viewport.lock()
    }

    pub fn camera(&self) -> Option<PerspectiveCamera> {
        *self.camera.lock()
    }
}

/// Render surface that records what the session pushes into it.
#[derive(Default)]
pub struct HeadlessSurface {
    probe: Arc<SurfaceProbe>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> Arc<SurfaceProbe> {
        Arc::clone(&self.probe)
    }
}

impl RenderSurface for HeadlessSurface {
    fn configure(&mut self, settings: &RenderSettings) {
        *self.probe.settings.lock() = Some(*settings);
    }

    fn set_viewport(&mut self, size: FrameSize) {
        *self.probe.viewport.lock() = Some(size);
    }

    fn set_camera(&mut self, camera: &PerspectiveCamera) {
        *self.probe.camera.lock() = Some(*camera);
    }
}

#[derive(Debug)]
pub struct ContainerProbe {
    size: Mutex<(f64, f64)>,
    attached: Mutex<Vec<SurfaceKind>>,
    layouts: Mutex<HashMap<SurfaceKind, DisplayLayout>>,
}

impl ContainerProbe {
    /// Simulate the host resizing the container.
    pub fn resize(&self, width: f64, height: f64) {
        *self.size.lock() = (width, height);
    }

    pub fn attached(&self) -> Vec<SurfaceKind> {
        self.attached.lock().clone()
    }

    pub fn is_attached(&self, surface: SurfaceKind) -> bool {
        self.attached.lock().contains(&surface)
    }

    pub fn layout(&self, surface: SurfaceKind) -> Option<DisplayLayout> {
        self.layouts.lock().get(&surface).copied()
    }
}

/// Display container that keeps track of attached surfaces and layouts.
pub struct RecordingContainer {
    probe: Arc<ContainerProbe>,
}

impl RecordingContainer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            probe: Arc::new(ContainerProbe {
                size: Mutex::new((width, height)),
                attached: Mutex::new(Vec::new()),
                layouts: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn probe(&self) -> Arc<ContainerProbe> {
        Arc::clone(&self.probe)
    }
}

impl DisplayContainer for RecordingContainer {
    fn client_size(&self) -> (f64, f64) {
        *self.probe.size.lock()
    }

    fn attach(&mut self, surface: SurfaceKind) {
        let mut attached = self.probe.attached.lock();
        if !attached.contains(&surface) {
            attached.push(surface);
        }
    }

    fn detach(&mut self, surface: SurfaceKind) {
        self.probe.attached.lock().retain(|s| *s != surface);
    }

    fn apply_layout(&mut self, surface: SurfaceKind, layout: &DisplayLayout) {
        self.probe.layouts.lock().insert(surface, *layout);
    }
}
