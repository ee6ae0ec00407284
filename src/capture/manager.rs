//! Capture manager: owns the lifecycle of the input stream.

use anyhow::Context;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::render::{DisplayContainer, SurfaceKind};

use super::device::{CaptureBackend, CaptureFault, InputHandle, StreamConstraints};

/// Lifecycle of the managed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No stream installed yet.
    #[default]
    Empty,
    /// Delivering frames.
    Live,
    /// Frame delivery stopped; `keep_alive` tells whether the element still runs.
    Paused { keep_alive: bool },
    /// Tracks stopped. Terminal.
    Released,
}

#[derive(Debug, Default)]
pub struct CaptureManager {
    input: Option<InputHandle>,
    state: CaptureState,
    attached: bool,
}

impl CaptureManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an environment-facing stream and wait for its metadata.
    ///
    /// This blocks on the permission prompt and the metadata signal, so the
    /// session calls it without holding its lock. The result is installed
    /// with [`CaptureManager::install`] once the caller knows it is still
    /// wanted.
    ///
    /// # Errors
    ///
    /// - [`SessionError::CaptureUnavailable`] if the backend has no capture API
    /// - [`SessionError::CaptureDenied`] if permission is rejected
    /// - [`SessionError::CaptureError`] for device or metadata failures
    pub fn acquire(
        backend: &dyn CaptureBackend,
        constraints: &StreamConstraints,
    ) -> Result<InputHandle> {
        if !backend.is_available() {
            return Err(SessionError::CaptureUnavailable);
        }

        let mut stream = backend.open(constraints).map_err(|fault| match fault {
            CaptureFault::Denied(msg) => SessionError::CaptureDenied(msg),
            CaptureFault::Device(msg) => SessionError::CaptureError(msg),
        })?;

        let size = match stream
            .wait_for_metadata()
            .context("waiting for stream metadata")
        {
            Ok(size) if !size.is_empty() => size,
            Ok(size) => {
                stream.stop_tracks();
                return Err(SessionError::CaptureError(format!(
                    "stream reported empty frame size {}x{}",
                    size.width, size.height
                )));
            }
            Err(e) => {
                stream.stop_tracks();
                return Err(SessionError::CaptureError(format!("{e:#}")));
            }
        };

        info!(width = size.width, height = size.height, "camera stream ready");
        Ok(InputHandle::new(stream, size))
    }

    /// Take ownership of an acquired stream.
    pub fn install(&mut self, input: InputHandle) {
        debug_assert_eq!(self.state, CaptureState::Empty);
        self.input = Some(input);
        self.state = CaptureState::Live;
    }

    pub fn input(&self) -> Option<&InputHandle> {
        self.input.as_ref()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Insert the input surface into the container.
    pub fn attach(&mut self, container: &mut dyn DisplayContainer) {
        if self.input.is_none() || self.attached {
            return;
        }
        container.attach(SurfaceKind::Input);
        self.attached = true;
    }

    /// Stop frame delivery. Unless `keep_alive`, also halt the element.
    pub fn pause(&mut self, keep_alive: bool) {
        let Some(input) = &self.input else {
            return;
        };
        if self.state != CaptureState::Live {
            return;
        }
        if !keep_alive {
            input.pause();
        }
        self.state = CaptureState::Paused { keep_alive };
        debug!(keep_alive, "capture paused");
    }

    /// Restart frame delivery of a paused stream.
    pub fn resume(&mut self) -> Result<()> {
        match (self.state, &self.input) {
            (CaptureState::Paused { .. }, Some(input)) => {
                input
                    .play()
                    .map_err(|e| SessionError::CaptureError(format!("{e:#}")))?;
                self.state = CaptureState::Live;
                debug!("capture resumed");
                Ok(())
            }
            (CaptureState::Live, Some(_)) => Ok(()),
            (state, _) => Err(SessionError::CaptureInactive {
                operation: "resume capture",
                state,
            }),
        }
    }

    /// Stop all hardware tracks and detach the input surface.
    ///
    /// Idempotent: tracks are stopped at most once.
    pub fn release(&mut self, container: &mut dyn DisplayContainer) {
        if self.state == CaptureState::Released {
            return;
        }
        if let Some(input) = self.input.take() {
            input.stop_tracks();
            info!("camera tracks stopped");
        } else {
            debug!("releasing capture that never acquired a stream");
        }
        if self.attached {
            container.detach(SurfaceKind::Input);
            self.attached = false;
        }
        self.state = CaptureState::Released;
    }
}
