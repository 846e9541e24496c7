//! Marker Arkanoid entry point
//!
//! Runs the full pipeline against the synthetic camera and a headless
//! display. A real camera or window plugs in through the `platform` traits.

use anyhow::Context;

use marker_arkanoid::Settings;
use marker_arkanoid::consts::*;
use marker_arkanoid::pipeline::{Pipeline, RunFlag};
use marker_arkanoid::platform::{HeadlessDisplay, SyntheticCamera, SystemClock};

/// Number of frames to show before quitting; runs until killed when unset
const FRAME_LIMIT_VAR: &str = "MARKER_ARKANOID_FRAMES";

fn frame_limit() -> anyhow::Result<Option<u64>> {
    match std::env::var(FRAME_LIMIT_VAR) {
        Ok(value) => {
            let limit = value
                .parse()
                .with_context(|| format!("{FRAME_LIMIT_VAR} must be a frame count, got {value:?}"))?;
            Ok(Some(limit))
        }
        Err(_) => Ok(None),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Marker Arkanoid starting...");

    let settings = Settings::load();
    let display = match frame_limit()? {
        Some(limit) => HeadlessDisplay::quit_after(limit),
        None => HeadlessDisplay::new(),
    };
    let camera =
        SyntheticCamera::new(CAPTURE_WIDTH, CAPTURE_HEIGHT, rand::random()).paced(CAPTURE_FPS);

    let pipeline = Pipeline::start(camera, (CAPTURE_WIDTH, CAPTURE_HEIGHT), settings)
        .context("failed to start the pipeline")?;
    let display = pipeline
        .run(display, SystemClock::new(), &RunFlag::new())
        .context("game loop failed")?;

    log::info!("Stopped after {} frames", display.frames_shown());
    Ok(())
}
