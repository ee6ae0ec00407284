//! Synthetic camera backend producing gradient frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::capture::{CaptureBackend, CaptureFault, StreamConstraints, VideoFrame, VideoStream};
use crate::geometry::FrameSize;

/// Counters exposed to tests and the demo.
#[derive(Debug, Default)]
pub struct CameraProbe {
    opened: AtomicUsize,
    plays: AtomicUsize,
    pauses: AtomicUsize,
    tracks_stopped: AtomicUsize,
    last_constraints: Mutex<Option<StreamConstraints>>,
}

impl CameraProbe {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn tracks_stopped(&self) -> usize {
        self.tracks_stopped.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<StreamConstraints> {
        *self.last_constraints.lock()
    }
}

#[derive(Debug, Clone, Copy)]
enum Availability {
    Available,
    Unavailable,
    Denied,
}

/// Camera backend that never touches hardware.
pub struct SimulatedCamera {
    size: FrameSize,
    availability: Availability,
    metadata_delay: Duration,
    probe: Arc<CameraProbe>,
}

impl SimulatedCamera {
    pub fn new(size: FrameSize) -> Self {
        Self {
            size,
            availability: Availability::Available,
            metadata_delay: Duration::ZERO,
            probe: Arc::new(CameraProbe::default()),
        }
    }

    /// Platform without any capture API.
    pub fn unavailable() -> Self {
        Self {
            availability: Availability::Unavailable,
            ..Self::new(FrameSize::new(640, 480))
        }
    }

    /// Platform where the user rejects the permission prompt.
    pub fn denied() -> Self {
        Self {
            availability: Availability::Denied,
            ..Self::new(FrameSize::new(640, 480))
        }
    }

    /// Delay before the stream reports its metadata.
    pub fn with_metadata_delay(mut self, delay: Duration) -> Self {
        self.metadata_delay = delay;
        self
    }

    pub fn probe(&self) -> Arc<CameraProbe> {
        Arc::clone(&self.probe)
    }
}

impl CaptureBackend for SimulatedCamera {
    fn is_available(&self) -> bool {
        !matches!(self.availability, Availability::Unavailable)
    }

    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureFault> {
        *self.probe.last_constraints.lock() = Some(*constraints);
        match self.availability {
            Availability::Denied => Err(CaptureFault::Denied("NotAllowedError".into())),
            Availability::Unavailable => Err(CaptureFault::Device("no capture API".into())),
            Availability::Available => {
                self.probe.opened.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(SimulatedStream {
                    size: self.size,
                    metadata_delay: self.metadata_delay,
                    probe: Arc::clone(&self.probe),
                    started: Instant::now(),
                    frame_count: 0,
                    playing: true,
                    stopped: false,
                }))
            }
        }
    }
}

struct SimulatedStream {
    size: FrameSize,
    metadata_delay: Duration,
    probe: Arc<CameraProbe>,
    started: Instant,
    frame_count: u64,
    playing: bool,
    stopped: bool,
}

impl VideoStream for SimulatedStream {
    fn wait_for_metadata(&mut self) -> anyhow::Result<FrameSize> {
        if !self.metadata_delay.is_zero() {
            thread::sleep(self.metadata_delay);
        }
        Ok(self.size)
    }

    fn play(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.stopped, "stream tracks already stopped");
        self.probe.plays.fetch_add(1, Ordering::SeqCst);
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.probe.pauses.fetch_add(1, Ordering::SeqCst);
        self.playing = false;
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.probe.tracks_stopped.fetch_add(1, Ordering::SeqCst);
        }
        self.stopped = true;
        self.playing = false;
    }

    fn read_frame(&mut self) -> Option<VideoFrame> {
        if self.stopped || !self.playing || self.size.is_empty() {
            return None;
        }
        self.frame_count += 1;

        let (w, h) = (self.size.width as usize, self.size.height as usize);
        let shift = (self.frame_count % 256) as usize;
        let mut data = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                data.push(((x + shift) % 256) as u8);
                data.push((y % 256) as u8);
                data.push(128);
                data.push(255);
            }
        }

        Some(VideoFrame {
            size: self.size,
            timestamp_ms: self.started.elapsed().as_secs_f64() * 1000.0,
            data,
        })
    }
}
