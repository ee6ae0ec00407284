use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ar_session::anchor::{TargetDimensions, TargetIndex};
use ar_session::geometry::FrameSize;
use ar_session::io::config::SessionConfig;
use ar_session::render::RenderContext;
use ar_session::sim::{HeadlessSurface, RecordingContainer, ScriptedTracker, SimulatedCamera};
use ar_session::system::messages::PoseUpdate;
use ar_session::{ArSession, SessionState};

/// Frames rendered per phase of the demo.
const FRAMES_PER_PHASE: usize = 30;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_yaml_file(&path)?,
        None => SessionConfig::default(),
    };
    info!(?config, "configuration loaded");

    // Target 0 is seen for a dozen frames, then lost for a dozen.
    let target = TargetIndex::new(0);
    let mut world = [0.0f32; 16];
    world[0] = 1.0;
    world[5] = 1.0;
    world[10] = 1.0;
    world[14] = -500.0;
    world[15] = 1.0;
    let script: Vec<PoseUpdate> = std::iter::repeat_n(PoseUpdate::found(target, world), 12)
        .chain(std::iter::repeat_n(PoseUpdate::lost(target), 12))
        .collect();

    let camera = Arc::new(SimulatedCamera::new(FrameSize::new(640, 480)));
    let tracker = ScriptedTracker::new(vec![TargetDimensions::new(1.0, 0.5625)])
        .with_script(script, FRAME_INTERVAL);
    let container = RecordingContainer::new(1600.0, 900.0);
    let container_probe = container.probe();
    let render = RenderContext::new(Box::new(HeadlessSurface::new()), Box::new(container));

    let mut session = ArSession::new(config, camera, Box::new(tracker), render)?;
    let events = session.subscribe();

    let state = session.start()?.wait();
    if state != SessionState::Processing {
        for event in events.try_iter() {
            println!("{}", serde_json::to_string(&event)?);
        }
        bail!("session failed to start: {state:?}");
    }

    let anchor = session.create_anchor(target)?;
    if let Some(geometry) = session.geometry() {
        info!(fov = geometry.camera.fov_deg, layout = ?geometry.layout, "initial geometry");
    }

    let render_frames = |session: &ArSession, frames: usize| -> Result<()> {
        for _ in 0..frames {
            session.poll_pose_updates();
            for event in events.try_iter() {
                println!("{}", serde_json::to_string(&event)?);
            }
            thread::sleep(FRAME_INTERVAL);
        }
        Ok(())
    };

    render_frames(&session, FRAMES_PER_PHASE)?;
    info!(visible = anchor.is_visible(), "anchor state");

    container_probe.resize(900.0, 1600.0);
    let geometry = session.recompute_geometry()?;
    info!(layout = ?geometry.layout, "geometry after rotation");

    session.pause(false)?;
    render_frames(&session, FRAMES_PER_PHASE / 2)?;
    session.unpause()?;
    render_frames(&session, FRAMES_PER_PHASE)?;

    session.stop();
    info!(state = ?session.state(), "demo finished");
    Ok(())
}
