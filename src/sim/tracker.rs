//! Scripted tracker for tests and the demo binary.
//!
//! Registers a fixed target set and either replays a script of pose updates
//! on its own frame loop or lets the caller push updates through its probe.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow, ensure};
use crossbeam_channel::Sender;
use nalgebra::Perspective3;
use parking_lot::Mutex;

use crate::anchor::TargetDimensions;
use crate::capture::InputHandle;
use crate::system::messages::PoseUpdate;
use crate::tracking::{Tracker, TrackerCapabilities};

/// Projection array of a symmetric perspective frustum.
pub fn symmetric_projection(fov_deg: f32, aspect: f32, near: f32, far: f32) -> [f32; 16] {
    let m = Perspective3::new(aspect, fov_deg.to_radians(), near, far).to_homogeneous();
    let mut out = [0.0f32; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// Observation points into a [`ScriptedTracker`] after it was boxed.
#[derive(Debug, Default)]
pub struct TrackerProbe {
    capabilities: Mutex<Option<TrackerCapabilities>>,
    updates: Mutex<Option<Sender<PoseUpdate>>>,
    warm_ups: AtomicUsize,
    begins: AtomicUsize,
    ends: AtomicUsize,
    processing: AtomicBool,
}

impl TrackerProbe {
    pub fn capabilities(&self) -> Option<TrackerCapabilities> {
        *self.capabilities.lock()
    }

    pub fn warm_ups(&self) -> usize {
        self.warm_ups.load(Ordering::SeqCst)
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Send an update as if a frame had just been processed.
    /// Returns `false` before initialization or once the session is gone.
    pub fn push(&self, update: PoseUpdate) -> bool {
        self.updates
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(update).is_ok())
    }
}

pub struct ScriptedTracker {
    targets: Vec<TargetDimensions>,
    projection: [f32; 16],
    register_error: Option<String>,
    init_delay: Duration,
    script: Vec<PoseUpdate>,
    frame_interval: Duration,
    probe: Arc<TrackerProbe>,
    frame_loop: Option<JoinHandle<()>>,
}

impl ScriptedTracker {
    pub fn new(targets: Vec<TargetDimensions>) -> Self {
        Self {
            targets,
            projection: symmetric_projection(45.0, 4.0 / 3.0, 10.0, 100_000.0),
            register_error: None,
            init_delay: Duration::ZERO,
            script: Vec::new(),
            frame_interval: Duration::from_millis(16),
            probe: Arc::new(TrackerProbe::default()),
            frame_loop: None,
        }
    }

    pub fn with_projection(mut self, projection: [f32; 16]) -> Self {
        self.projection = projection;
        self
    }

    /// Make target registration fail with `message`.
    pub fn failing_registration(mut self, message: impl Into<String>) -> Self {
        self.register_error = Some(message.into());
        self
    }

    /// Block for `delay` during target registration.
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    /// Updates replayed cyclically, one per frame, while processing.
    pub fn with_script(mut self, script: Vec<PoseUpdate>, frame_interval: Duration) -> Self {
        self.script = script;
        self.frame_interval = frame_interval;
        self
    }

    pub fn probe(&self) -> Arc<TrackerProbe> {
        Arc::clone(&self.probe)
    }

    fn join_frame_loop(&mut self) {
        if let Some(handle) = self.frame_loop.take() {
            let _ = handle.join();
        }
    }
}

impl Tracker for ScriptedTracker {
    fn initialize(&mut self, caps: TrackerCapabilities, updates: Sender<PoseUpdate>) -> Result<()> {
        ensure!(caps.max_track >= 1, "max_track must be at least 1");
        *self.probe.capabilities.lock() = Some(caps);
        *self.probe.updates.lock() = Some(updates);
        Ok(())
    }

    fn register_targets(&mut self, source: &str) -> Result<Vec<TargetDimensions>> {
        if !self.init_delay.is_zero() {
            thread::sleep(self.init_delay);
        }
        if let Some(message) = &self.register_error {
            return Err(anyhow!("{message}").context(source.to_string()));
        }
        Ok(self.targets.clone())
    }

    fn warm_up(&mut self, input: &InputHandle) -> Result<()> {
        // One frame is enough to exercise the pipeline.
        let _ = input.read_frame();
        self.probe.warm_ups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn begin_processing(&mut self, input: &InputHandle) {
        self.join_frame_loop();
        self.probe.begins.fetch_add(1, Ordering::SeqCst);
        self.probe.processing.store(true, Ordering::SeqCst);

        if self.script.is_empty() {
            return;
        }
        let Some(updates) = self.probe.updates.lock().clone() else {
            return;
        };

        let probe = Arc::clone(&self.probe);
        let script = self.script.clone();
        let interval = self.frame_interval;
        let input = input.clone();
        self.frame_loop = Some(thread::spawn(move || {
            for update in script.iter().cycle() {
                if !probe.is_processing() {
                    break;
                }
                if input.read_frame().is_some() && updates.send(*update).is_err() {
                    break;
                }
                thread::sleep(interval);
            }
        }));
    }

    fn end_processing(&mut self) {
        self.probe.ends.fetch_add(1, Ordering::SeqCst);
        self.probe.processing.store(false, Ordering::SeqCst);
        self.join_frame_loop();
    }

    fn projection_matrix(&self) -> [f32; 16] {
        self.projection
    }
}

impl Drop for ScriptedTracker {
    fn drop(&mut self) {
        self.probe.processing.store(false, Ordering::SeqCst);
        self.join_frame_loop();
    }
}
