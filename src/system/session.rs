//! AR session - main entry point for hosts.
//!
//! The `ArSession` owns the capture stream, the tracker and the anchor
//! registry. `start()` spawns a startup worker that acquires the camera,
//! initializes the tracker and warms it up; the host drives steady state by
//! calling [`ArSession::poll_pose_updates`] once per rendered frame.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, error, info, warn};

use crate::anchor::{AnchorHandle, TargetDimensions, TargetIndex};
use crate::capture::{CaptureBackend, CaptureManager, InputHandle};
use crate::error::{Result, SessionError};
use crate::geometry::{DisplayGeometry, FrameSize};
use crate::io::config::SessionConfig;
use crate::render::RenderContext;
use crate::tracking::{Tracker, TrackerCapabilities};

use super::events::{ArErrorCode, SessionEvent};
use super::messages::PoseUpdate;
use super::shared_state::{SessionInner, SharedState};
use super::state::SessionState;

/// Camera-driven AR session.
pub struct ArSession {
    /// Session data shared with the startup worker.
    shared: Arc<SharedState>,

    config: SessionConfig,

    backend: Arc<dyn CaptureBackend>,

    /// Handed to the tracker on start. `None` once started.
    pose_sender: Option<Sender<PoseUpdate>>,

    /// Pose updates from the tracker, in emission order.
    pose_receiver: Receiver<PoseUpdate>,
}

/// Handle to the startup worker spawned by [`ArSession::start`].
pub struct StartupHandle {
    shared: Arc<SharedState>,
    handle: JoinHandle<()>,
}

impl StartupHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until startup completed (or was abandoned) and return the
    /// session state at that point.
    pub fn wait(self) -> SessionState {
        if self.handle.join().is_err() {
            error!("startup worker panicked");
        }
        self.shared.session.lock().state
    }
}

impl ArSession {
    /// Create an idle session.
    ///
    /// Rendering collaborators are injected here; nothing is acquired until
    /// [`ArSession::start`].
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn CaptureBackend>,
        tracker: Box<dyn Tracker>,
        render: RenderContext,
    ) -> Result<Self> {
        config.validate()?;

        let (pose_sender, pose_receiver) = unbounded();
        let shared = SharedState::new(SessionInner::new(tracker, render));

        Ok(Self {
            shared,
            config,
            backend,
            pose_sender: Some(pose_sender),
            pose_receiver,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Listen for session events emitted from now on.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.shared.session.lock().state
    }

    /// Begin startup: `Idle → Starting`.
    ///
    /// The rest of the sequence runs on a startup worker. Its outcome is
    /// reported through `arReady` or `arError`.
    pub fn start(&mut self) -> Result<StartupHandle> {
        let updates = {
            let mut inner = self.shared.session.lock();
            let state = inner.state;
            let updates = match (state, self.pose_sender.take()) {
                (SessionState::Idle, Some(updates)) => updates,
                (_, sender) => {
                    self.pose_sender = sender;
                    return Err(SessionError::InvalidState {
                        operation: "start",
                        state,
                    });
                }
            };
            inner.state = SessionState::Starting;
            updates
        };

        info!(targets = %self.config.image_target_src, "starting AR session");

        let job = StartupJob {
            shared: Arc::clone(&self.shared),
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            updates,
        };
        let handle = thread::spawn(move || run_startup(job));

        Ok(StartupHandle {
            shared: Arc::clone(&self.shared),
            handle,
        })
    }

    /// `Processing → Paused`. Stops tracker frame consumption and, unless
    /// `keep_video`, the capture element.
    pub fn pause(&self, keep_video: bool) -> Result<()> {
        let mut guard = self.shared.session.lock();
        let inner = &mut *guard;
        if inner.state != SessionState::Processing {
            return Err(SessionError::InvalidState {
                operation: "pause",
                state: inner.state,
            });
        }

        inner.halt_tracker();
        inner.capture.pause(keep_video);
        inner.state = SessionState::Paused;
        info!(keep_video, "session paused");
        Ok(())
    }

    /// `Paused → Processing`. Resumes capture and tracker frame consumption.
    pub fn unpause(&self) -> Result<()> {
        let mut guard = self.shared.session.lock();
        let inner = &mut *guard;
        if inner.state != SessionState::Paused {
            return Err(SessionError::InvalidState {
                operation: "unpause",
                state: inner.state,
            });
        }

        inner.capture.resume()?;
        if let (Some(tracker), Some(input)) = (inner.tracker.as_mut(), inner.capture.input()) {
            tracker.begin_processing(input);
        }
        inner.state = SessionState::Processing;
        info!("session resumed");
        Ok(())
    }

    /// Stop the session from any state. Terminal.
    ///
    /// Releases the camera, removes both surfaces and makes any in-flight
    /// startup discard its results.
    pub fn stop(&self) {
        self.shared.request_stop();

        let mut inner = self.shared.session.lock();
        if inner.state == SessionState::Stopped {
            return;
        }
        let previous = inner.state;

        inner.halt_tracker();
        inner.teardown();
        inner.state = SessionState::Stopped;
        info!(?previous, "session stopped");
    }

    /// Re-derive display geometry after a container resize.
    pub fn recompute_geometry(&self) -> Result<DisplayGeometry> {
        let mut inner = self.shared.session.lock();
        if !inner.state.has_display() {
            return Err(SessionError::InvalidState {
                operation: "recompute geometry",
                state: inner.state,
            });
        }
        let state = inner.state;
        inner
            .refresh_geometry()
            .ok_or(SessionError::InvalidState {
                operation: "recompute geometry",
                state,
            })
    }

    /// Create an anchor following `target_index`.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownTarget`] unless the tracker registered the target,
    /// [`SessionError::DegenerateTarget`] if its registered size is not positive.
    pub fn create_anchor(&self, target_index: TargetIndex) -> Result<AnchorHandle> {
        self.shared
            .session
            .lock()
            .anchors
            .create_anchor(target_index)
    }

    /// Apply every pose update queued by the tracker, in order.
    ///
    /// Call once per rendered frame. Returns the number of updates applied.
    pub fn poll_pose_updates(&self) -> usize {
        let updates: Vec<PoseUpdate> = self.pose_receiver.try_iter().collect();
        if updates.is_empty() {
            return 0;
        }

        let inner = self.shared.session.lock();
        if !inner.state.accepts_pose_updates() {
            debug!(
                dropped = updates.len(),
                state = ?inner.state,
                "dropping pose updates"
            );
            return 0;
        }
        for update in &updates {
            inner.anchors.apply_pose_update(update, &self.shared.events);
        }
        updates.len()
    }

    /// Geometry from the last (re)computation.
    pub fn geometry(&self) -> Option<DisplayGeometry> {
        self.shared.session.lock().geometry
    }

    pub fn input_size(&self) -> Option<FrameSize> {
        self.shared
            .session
            .lock()
            .capture
            .input()
            .map(InputHandle::size)
    }

    pub fn target_dimensions(&self) -> Vec<TargetDimensions> {
        self.shared
            .session
            .lock()
            .anchors
            .target_dimensions()
            .to_vec()
    }

    pub fn anchors(&self) -> Vec<AnchorHandle> {
        self.shared.session.lock().anchors.anchors().to_vec()
    }

    /// Run `f` with exclusive access to the injected render context.
    pub fn with_render_context<R>(&self, f: impl FnOnce(&mut RenderContext) -> R) -> R {
        f(&mut self.shared.session.lock().render)
    }
}

impl Drop for ArSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the startup worker needs.
struct StartupJob {
    shared: Arc<SharedState>,
    backend: Arc<dyn CaptureBackend>,
    config: SessionConfig,
    updates: Sender<PoseUpdate>,
}

/// Startup sequence: camera → tracker → warm-up → attach → ready → processing.
fn run_startup(job: StartupJob) {
    let StartupJob {
        shared,
        backend,
        config,
        updates,
    } = job;

    // Stage 1: camera
    let input = match CaptureManager::acquire(backend.as_ref(), &config.stream_constraints()) {
        Ok(input) => input,
        Err(err) => {
            warn!(error = %err, "video startup failed");
            let mut inner = shared.session.lock();
            shared.fail_startup(&mut inner, ArErrorCode::VideoFail);
            return;
        }
    };

    let mut tracker = {
        let mut inner = shared.session.lock();
        if shared.is_stop_requested() {
            info!("session stopped while acquiring camera, releasing stream");
            input.stop_tracks();
            return;
        }
        inner.capture.install(input.clone());
        match inner.tracker.take() {
            Some(tracker) => tracker,
            None => {
                error!("tracker missing at startup");
                shared.fail_startup(&mut inner, ArErrorCode::ArFail);
                return;
            }
        }
    };

    // Stage 2: tracker initialization, target registration and warm-up
    let result = initialize_tracker(tracker.as_mut(), &input, &config, updates);

    let mut guard = shared.session.lock();
    let inner = &mut *guard;
    inner.tracker = Some(tracker);

    if shared.is_stop_requested() {
        info!("session stopped during tracker initialization, discarding result");
        return;
    }

    let dimensions = match result {
        Ok(dimensions) => dimensions,
        Err(err) => {
            let err = SessionError::TrackerInitFailure(err);
            warn!(error = %err, "AR startup failed");
            shared.fail_startup(inner, ArErrorCode::ArFail);
            return;
        }
    };

    // Stage 3: display
    inner.anchors.set_target_dimensions(dimensions);
    inner.render.surface.configure(&config.renderer);
    inner.attach_surfaces();
    inner.refresh_geometry();
    inner.state = SessionState::Ready;
    shared.events.emit(SessionEvent::ArReady);

    // Stage 4: steady state
    if let Some(tracker) = inner.tracker.as_mut() {
        tracker.begin_processing(&input);
    }
    inner.state = SessionState::Processing;
    info!("AR session processing");
}

fn initialize_tracker(
    tracker: &mut dyn Tracker,
    input: &InputHandle,
    config: &SessionConfig,
    updates: Sender<PoseUpdate>,
) -> anyhow::Result<Vec<TargetDimensions>> {
    let caps = TrackerCapabilities {
        input_size: input.size(),
        max_track: config.max_track,
    };
    tracker
        .initialize(caps, updates)
        .context("Failed to initialize tracker")?;

    let dimensions = tracker
        .register_targets(&config.image_target_src)
        .with_context(|| format!("Failed to register targets from {}", config.image_target_src))?;

    for (index, dims) in dimensions.iter().enumerate() {
        if !(dims.width > 0.0 && dims.height > 0.0) {
            warn!(
                target = %TargetIndex::new(index),
                width = dims.width,
                height = dims.height,
                "target has degenerate dimensions, anchors cannot follow it"
            );
        }
    }

    if config.warm_up {
        tracker.warm_up(input).context("Tracker warm-up failed")?;
    }

    info!(targets = dimensions.len(), "tracker ready");
    Ok(dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SurfaceKind;
    use crate::sim::{
        ContainerProbe, HeadlessSurface, RecordingContainer, ScriptedTracker, SimulatedCamera,
        SurfaceProbe,
    };
    use approx::assert_relative_eq;
    use std::time::Duration;

    struct Harness {
        session: ArSession,
        events: Receiver<SessionEvent>,
        container: Arc<ContainerProbe>,
        surface: Arc<SurfaceProbe>,
    }

    fn harness(camera: Arc<SimulatedCamera>, tracker: ScriptedTracker) -> Harness {
        let surface = HeadlessSurface::new();
        let container = RecordingContainer::new(1600.0, 900.0);
        let (surface_probe, container_probe) = (surface.probe(), container.probe());
        let render = RenderContext::new(Box::new(surface), Box::new(container));

        let session = ArSession::new(
            SessionConfig::with_targets("cards.mind"),
            camera,
            Box::new(tracker),
            render,
        )
        .unwrap();
        let events = session.subscribe();
        Harness {
            session,
            events,
            container: container_probe,
            surface: surface_probe,
        }
    }

    fn one_target() -> ScriptedTracker {
        ScriptedTracker::new(vec![TargetDimensions::new(1.0, 0.5)])
    }

    fn vga_camera() -> Arc<SimulatedCamera> {
        Arc::new(SimulatedCamera::new(FrameSize::new(640, 480)))
    }

    fn translation_elements(z: f32) -> [f32; 16] {
        let mut m = [0.0f32; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[14] = z;
        m[15] = 1.0;
        m
    }

    #[test]
    fn test_start_reaches_processing_and_emits_ready_once() {
        let camera = vga_camera();
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(Arc::clone(&camera), tracker);

        let state = h.session.start().unwrap().wait();

        assert_eq!(state, SessionState::Processing);
        assert_eq!(h.events.try_iter().collect::<Vec<_>>(), vec![SessionEvent::ArReady]);
        assert!(h.container.is_attached(SurfaceKind::Input));
        assert!(h.container.is_attached(SurfaceKind::Render));
        assert_eq!(tracker_probe.warm_ups(), 1);
        assert_eq!(tracker_probe.begins(), 1);
        assert!(tracker_probe.is_processing());

        let caps = tracker_probe.capabilities().unwrap();
        assert_eq!(caps.input_size, FrameSize::new(640, 480));
        assert_eq!(caps.max_track, 1);
        assert_eq!(
            camera.probe().last_constraints(),
            Some(crate::capture::StreamConstraints::default())
        );
        assert_eq!(h.session.input_size(), Some(FrameSize::new(640, 480)));
        assert_eq!(h.session.target_dimensions(), vec![TargetDimensions::new(1.0, 0.5)]);
    }

    #[test]
    fn test_start_applies_geometry_to_both_surfaces() {
        let mut h = harness(vga_camera(), one_target());
        h.session.start().unwrap().wait();

        let geometry = h.session.geometry().unwrap();
        // 4:3 input in a 1600x900 container: match widths, overflow vertically.
        assert_relative_eq!(geometry.layout.width, 1600.0);
        assert_relative_eq!(geometry.layout.height, 1200.0);
        assert_relative_eq!(geometry.layout.top, -150.0);
        assert_relative_eq!(geometry.layout.left, 0.0);
        assert_relative_eq!(geometry.camera.fov_deg, 45.0, epsilon = 1e-3);
        assert_relative_eq!(geometry.camera.aspect, 640.0 / 480.0, epsilon = 1e-6);

        assert_eq!(h.container.layout(SurfaceKind::Input), Some(geometry.layout));
        assert_eq!(h.container.layout(SurfaceKind::Render), Some(geometry.layout));
        assert_eq!(h.surface.viewport(), Some(FrameSize::new(640, 480)));
        assert_eq!(h.surface.camera(), Some(geometry.camera));
        assert!(h.surface.settings().unwrap().antialias);
        assert_eq!(
            h.session.with_render_context(|ctx| ctx.container.client_size()),
            (1600.0, 900.0)
        );
    }

    #[test]
    fn test_missing_capture_reports_video_fail() {
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(Arc::new(SimulatedCamera::unavailable()), tracker);

        let state = h.session.start().unwrap().wait();

        assert_eq!(state, SessionState::Failed(ArErrorCode::VideoFail));
        assert_eq!(
            h.events.try_iter().collect::<Vec<_>>(),
            vec![SessionEvent::ArError {
                error: ArErrorCode::VideoFail
            }]
        );
        assert!(h.container.attached().is_empty());
        assert!(tracker_probe.capabilities().is_none());
    }

    #[test]
    fn test_denied_capture_reports_video_fail() {
        let mut h = harness(Arc::new(SimulatedCamera::denied()), one_target());

        let state = h.session.start().unwrap().wait();

        assert_eq!(state, SessionState::Failed(ArErrorCode::VideoFail));
        assert_eq!(h.events.try_iter().count(), 1);
    }

    #[test]
    fn test_registration_failure_reports_ar_fail_and_releases_camera() {
        let camera = vga_camera();
        let tracker = one_target().failing_registration("corrupt target file");
        let mut h = harness(Arc::clone(&camera), tracker);

        let state = h.session.start().unwrap().wait();

        assert_eq!(state, SessionState::Failed(ArErrorCode::ArFail));
        assert_eq!(
            h.events.try_iter().collect::<Vec<_>>(),
            vec![SessionEvent::ArError {
                error: ArErrorCode::ArFail
            }]
        );
        assert_eq!(camera.probe().tracks_stopped(), 1);
        assert!(h.container.attached().is_empty());
        assert_eq!(h.session.input_size(), None);
    }

    #[test]
    fn test_degenerate_target_only_blocks_its_own_anchors() {
        let tracker = ScriptedTracker::new(vec![
            TargetDimensions::new(0.0, 1.0),
            TargetDimensions::new(1.0, 1.0),
        ]);
        let mut h = harness(vga_camera(), tracker);

        let state = h.session.start().unwrap().wait();

        assert_eq!(state, SessionState::Processing);
        assert_eq!(h.events.try_iter().collect::<Vec<_>>(), vec![SessionEvent::ArReady]);
        assert!(matches!(
            h.session.create_anchor(TargetIndex::new(0)),
            Err(SessionError::DegenerateTarget {
                target_index: TargetIndex(0),
                ..
            })
        ));
        assert!(h.session.create_anchor(TargetIndex::new(1)).is_ok());
        assert_eq!(h.session.anchors().len(), 1);
    }

    #[test]
    fn test_stop_while_waiting_for_camera_discards_startup() {
        let camera = Arc::new(
            SimulatedCamera::new(FrameSize::new(640, 480))
                .with_metadata_delay(Duration::from_millis(100)),
        );
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(Arc::clone(&camera), tracker);

        let handle = h.session.start().unwrap();
        h.session.stop();
        let state = handle.wait();

        assert_eq!(state, SessionState::Stopped);
        assert_eq!(h.events.try_iter().count(), 0);
        assert_eq!(camera.probe().opened(), 1);
        assert_eq!(camera.probe().tracks_stopped(), 1);
        assert!(h.container.attached().is_empty());
        assert!(tracker_probe.capabilities().is_none());
    }

    #[test]
    fn test_stop_during_tracker_initialization_discards_startup() {
        let camera = vga_camera();
        let tracker = one_target().with_init_delay(Duration::from_millis(150));
        let tracker_probe = tracker.probe();
        let mut h = harness(Arc::clone(&camera), tracker);

        let handle = h.session.start().unwrap();
        thread::sleep(Duration::from_millis(30));
        h.session.stop();
        let state = handle.wait();

        assert_eq!(state, SessionState::Stopped);
        assert_eq!(h.events.try_iter().count(), 0);
        assert_eq!(camera.probe().tracks_stopped(), 1);
        assert_eq!(tracker_probe.begins(), 0);
        assert!(h.container.attached().is_empty());
        assert!(h.session.geometry().is_none());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut h = harness(vga_camera(), one_target());
        h.session.start().unwrap().wait();

        let err = h.session.start().err().unwrap();
        assert!(matches!(
            err,
            SessionError::InvalidState {
                operation: "start",
                state: SessionState::Processing
            }
        ));
    }

    #[test]
    fn test_pause_and_unpause_toggle_processing() {
        let camera = vga_camera();
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(Arc::clone(&camera), tracker);
        h.session.start().unwrap().wait();

        h.session.pause(false).unwrap();
        assert_eq!(h.session.state(), SessionState::Paused);
        assert_eq!(tracker_probe.ends(), 1);
        assert_eq!(camera.probe().pauses(), 1);
        assert!(matches!(
            h.session.pause(false),
            Err(SessionError::InvalidState { operation: "pause", .. })
        ));

        h.session.unpause().unwrap();
        assert_eq!(h.session.state(), SessionState::Processing);
        assert_eq!(tracker_probe.begins(), 2);
        assert!(tracker_probe.is_processing());
        assert!(matches!(
            h.session.unpause(),
            Err(SessionError::InvalidState { operation: "unpause", .. })
        ));
    }

    #[test]
    fn test_pause_keeping_video_leaves_stream_running() {
        let camera = vga_camera();
        let mut h = harness(Arc::clone(&camera), one_target());
        h.session.start().unwrap().wait();

        h.session.pause(true).unwrap();

        assert_eq!(camera.probe().pauses(), 0);
        assert!(h.container.is_attached(SurfaceKind::Input));
    }

    #[test]
    fn test_pause_before_start_is_invalid() {
        let h = harness(vga_camera(), one_target());
        assert!(matches!(
            h.session.pause(false),
            Err(SessionError::InvalidState {
                state: SessionState::Idle,
                ..
            })
        ));
    }

    #[test]
    fn test_recompute_geometry_follows_container_resize() {
        let mut h = harness(vga_camera(), one_target());
        assert!(h.session.recompute_geometry().is_err());
        h.session.start().unwrap().wait();

        h.container.resize(900.0, 1600.0);
        let geometry = h.session.recompute_geometry().unwrap();

        // Portrait container: match heights, overflow horizontally.
        assert_relative_eq!(geometry.layout.height, 1600.0);
        assert_relative_eq!(geometry.layout.width, 1600.0 * 4.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(geometry.layout.top, 0.0);
        assert_relative_eq!(
            geometry.layout.left,
            -(1600.0 * 4.0 / 3.0 - 900.0) / 2.0,
            epsilon = 1e-9
        );
        assert_eq!(h.container.layout(SurfaceKind::Render), Some(geometry.layout));
        assert_eq!(h.session.geometry(), Some(geometry));
    }

    #[test]
    fn test_create_anchor_requires_registered_target() {
        let mut h = harness(vga_camera(), one_target());
        assert!(matches!(
            h.session.create_anchor(TargetIndex::new(0)),
            Err(SessionError::UnknownTarget(TargetIndex(0)))
        ));

        h.session.start().unwrap().wait();

        assert!(h.session.create_anchor(TargetIndex::new(0)).is_ok());
        assert!(matches!(
            h.session.create_anchor(TargetIndex::new(1)),
            Err(SessionError::UnknownTarget(TargetIndex(1)))
        ));
        assert_eq!(h.session.anchors().len(), 1);
    }

    #[test]
    fn test_pose_updates_drive_anchor_and_events() {
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(vga_camera(), tracker);
        h.session.start().unwrap().wait();
        h.events.try_iter().for_each(drop);

        let target = TargetIndex::new(0);
        let anchor = h.session.create_anchor(target).unwrap();
        let world = translation_elements(-300.0);

        assert!(tracker_probe.push(PoseUpdate::found(target, world)));
        assert!(tracker_probe.push(PoseUpdate::found(target, world)));
        assert_eq!(h.session.poll_pose_updates(), 2);
        assert_eq!(
            h.events.try_iter().collect::<Vec<_>>(),
            vec![SessionEvent::TargetFound {
                target_index: target
            }]
        );
        assert!(anchor.is_visible());
        // Post transform moves the origin to the center of the 1.0 x 0.5 target.
        let m = anchor.matrix();
        assert_relative_eq!(m[(0, 3)], 0.5);
        assert_relative_eq!(m[(1, 3)], 0.25);
        assert_relative_eq!(m[(2, 3)], -300.0);

        tracker_probe.push(PoseUpdate::lost(target));
        assert_eq!(h.session.poll_pose_updates(), 1);
        assert_eq!(
            h.events.try_iter().collect::<Vec<_>>(),
            vec![SessionEvent::TargetLost {
                target_index: target
            }]
        );
        assert!(!anchor.is_visible());
        assert_relative_eq!(anchor.matrix()[(2, 3)], -300.0);
    }

    #[test]
    fn test_pose_updates_after_stop_are_dropped() {
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(vga_camera(), tracker);
        h.session.start().unwrap().wait();
        let anchor = h.session.create_anchor(TargetIndex::new(0)).unwrap();
        h.events.try_iter().for_each(drop);

        h.session.stop();
        tracker_probe.push(PoseUpdate::found(TargetIndex::new(0), translation_elements(-1.0)));

        assert_eq!(h.session.poll_pose_updates(), 0);
        assert_eq!(h.events.try_iter().count(), 0);
        assert!(!anchor.is_visible());
    }

    #[test]
    fn test_scripted_frame_loop_reaches_anchor() {
        let target = TargetIndex::new(0);
        let tracker = one_target().with_script(
            vec![PoseUpdate::found(target, translation_elements(-10.0))],
            Duration::from_millis(2),
        );
        let mut h = harness(vga_camera(), tracker);
        h.session.start().unwrap().wait();
        let anchor = h.session.create_anchor(target).unwrap();

        let mut applied = 0;
        for _ in 0..200 {
            applied += h.session.poll_pose_updates();
            if anchor.is_visible() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert!(applied > 0);
        assert!(anchor.is_visible());
    }

    #[test]
    fn test_stop_is_idempotent_and_releases_everything() {
        let camera = vga_camera();
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(Arc::clone(&camera), tracker);
        h.session.start().unwrap().wait();

        h.session.stop();
        h.session.stop();

        assert_eq!(h.session.state(), SessionState::Stopped);
        assert_eq!(camera.probe().tracks_stopped(), 1);
        assert_eq!(tracker_probe.ends(), 1);
        assert!(!tracker_probe.is_processing());
        assert!(h.container.attached().is_empty());
        assert_eq!(h.events.try_iter().collect::<Vec<_>>(), vec![SessionEvent::ArReady]);
    }

    #[test]
    fn test_stop_from_paused_releases_camera() {
        let camera = vga_camera();
        let tracker = one_target();
        let tracker_probe = tracker.probe();
        let mut h = harness(Arc::clone(&camera), tracker);
        h.session.start().unwrap().wait();
        h.session.pause(false).unwrap();

        h.session.stop();

        assert_eq!(h.session.state(), SessionState::Stopped);
        assert_eq!(camera.probe().tracks_stopped(), 1);
        assert_eq!(camera.probe().pauses(), 1);
        assert_eq!(tracker_probe.ends(), 1);
        assert!(h.container.attached().is_empty());
        assert_eq!(h.events.try_iter().collect::<Vec<_>>(), vec![SessionEvent::ArReady]);
    }

    #[test]
    fn test_stop_after_failed_startup() {
        let camera = vga_camera();
        let mut h = harness(
            Arc::clone(&camera),
            one_target().failing_registration("corrupt target file"),
        );
        assert_eq!(
            h.session.start().unwrap().wait(),
            SessionState::Failed(ArErrorCode::ArFail)
        );

        h.session.stop();

        assert_eq!(h.session.state(), SessionState::Stopped);
        assert_eq!(camera.probe().tracks_stopped(), 1);
        assert!(h.container.attached().is_empty());
        assert_eq!(
            h.events.try_iter().collect::<Vec<_>>(),
            vec![SessionEvent::ArError {
                error: ArErrorCode::ArFail
            }]
        );
    }

    #[test]
    fn test_recompute_geometry_while_paused() {
        let camera = vga_camera();
        let mut h = harness(Arc::clone(&camera), one_target());
        h.session.start().unwrap().wait();
        h.session.pause(true).unwrap();

        h.container.resize(900.0, 1600.0);
        let geometry = h.session.recompute_geometry().unwrap();

        assert_eq!(h.session.state(), SessionState::Paused);
        assert_relative_eq!(geometry.layout.height, 1600.0);
        assert_relative_eq!(geometry.layout.width, 1600.0 * 4.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(
            geometry.layout.left,
            -(1600.0 * 4.0 / 3.0 - 900.0) / 2.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(geometry.layout.top, 0.0);
        assert_eq!(h.container.layout(SurfaceKind::Input), Some(geometry.layout));
        assert_eq!(h.container.layout(SurfaceKind::Render), Some(geometry.layout));

        h.session.stop();

        assert_eq!(h.session.state(), SessionState::Stopped);
        assert_eq!(camera.probe().tracks_stopped(), 1);
        assert!(h.container.attached().is_empty());
        assert_eq!(h.events.try_iter().collect::<Vec<_>>(), vec![SessionEvent::ArReady]);
    }

    #[test]
    fn test_dropping_session_stops_camera() {
        let camera = vga_camera();
        let mut h = harness(Arc::clone(&camera), one_target());
        h.session.start().unwrap().wait();

        drop(h);

        assert_eq!(camera.probe().tracks_stopped(), 1);
    }
}
