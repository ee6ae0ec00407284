//! Shared state between the host-facing session and its startup worker.
//!
//! All session mutation goes through one `Mutex`, so every operation runs to
//! completion before the next one observes the state. Blocking collaborator
//! calls (camera permission, tracker initialization) happen outside the lock
//! and re-check `stop_requested` before their results are applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::anchor::AnchorRegistry;
use crate::capture::CaptureManager;
use crate::geometry::{DisplayGeometry, compute_display_geometry};
use crate::render::{RenderContext, SurfaceKind};
use crate::tracking::Tracker;

use super::events::{ArErrorCode, EventEmitter, SessionEvent};
use super::state::SessionState;

/// Mutable session data, guarded by [`SharedState::session`].
pub struct SessionInner {
    pub state: SessionState,
    pub capture: CaptureManager,

    /// `None` while the startup worker is initializing it.
    pub tracker: Option<Box<dyn Tracker>>,

    pub render: RenderContext,
    pub render_attached: bool,

    pub anchors: AnchorRegistry,
    pub geometry: Option<DisplayGeometry>,
}

impl SessionInner {
    pub fn new(tracker: Box<dyn Tracker>, render: RenderContext) -> Self {
        Self {
            state: SessionState::Idle,
            capture: CaptureManager::new(),
            tracker: Some(tracker),
            render,
            render_attached: false,
            anchors: AnchorRegistry::new(),
            geometry: None,
        }
    }

    /// Put the input and render surfaces into the container.
    pub fn attach_surfaces(&mut self) {
        self.capture.attach(self.render.container.as_mut());
        if !self.render_attached {
            self.render.container.attach(SurfaceKind::Render);
            self.render_attached = true;
        }
    }

    /// Re-derive display geometry and push it to both surfaces.
    ///
    /// Returns `None` if the tracker or the input is not available.
    pub fn refresh_geometry(&mut self) -> Option<DisplayGeometry> {
        let tracker = self.tracker.as_ref()?;
        let input_size = self.capture.input()?.size();
        let container_size = self.render.container.client_size();

        let geometry =
            compute_display_geometry(&tracker.projection_matrix(), input_size, container_size);

        self.render.surface.set_viewport(geometry.viewport);
        self.render.surface.set_camera(&geometry.camera);
        for surface in [SurfaceKind::Input, SurfaceKind::Render] {
            self.render.container.apply_layout(surface, &geometry.layout);
        }

        debug!(
            container_width = container_size.0,
            container_height = container_size.1,
            fov = geometry.camera.fov_deg,
            layout = ?geometry.layout,
            "display geometry updated"
        );
        self.geometry = Some(geometry);
        Some(geometry)
    }

    /// Stop tracker frame consumption if it is running.
    pub fn halt_tracker(&mut self) {
        if matches!(self.state, SessionState::Ready | SessionState::Processing) {
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.end_processing();
            }
        }
    }

    /// Release camera hardware and take both surfaces out of the container.
    pub fn teardown(&mut self) {
        self.capture.pause(false);
        self.capture.release(self.render.container.as_mut());
        if self.render_attached {
            self.render.container.detach(SurfaceKind::Render);
            self.render_attached = false;
        }
    }
}

/// State shared by the session handle and the startup worker.
pub struct SharedState {
    pub session: Mutex<SessionInner>,

    pub events: EventEmitter,

    /// Set by `stop()`. Late startup results are discarded when set.
    stop_requested: AtomicBool,
}

impl SharedState {
    pub fn new(inner: SessionInner) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(inner),
            events: EventEmitter::new(),
            stop_requested: AtomicBool::new(false),
        })
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Record a startup failure and report it to the host.
    ///
    /// Must be called with the session lock held. A failure that arrives
    /// after `stop()` is dropped silently.
    pub fn fail_startup(&self, inner: &mut SessionInner, code: ArErrorCode) {
        if self.is_stop_requested() || inner.state != SessionState::Starting {
            debug!(%code, "discarding startup failure after stop");
            return;
        }
        inner.teardown();
        inner.state = SessionState::Failed(code);
        info!(%code, "AR session failed to start");
        self.events.emit(SessionEvent::ArError { error: code });
    }
}
