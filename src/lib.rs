//! Marker Arkanoid - a block-breaking game steered by a hand-held marker
//!
//! Core modules:
//! - `queue`: Lossy bounded hand-off between pipeline threads
//! - `vision`: Frame differencing and contour extraction
//! - `tracking`: Kalman-smoothed marker position and grip gesture
//! - `pipeline`: Capture, tracking and game loop workers
//! - `sim`: Deterministic block/paddle/ball simulation
//! - `renderer`: Draws the simulation onto a frame
//! - `platform`: Camera, display and clock collaborators

pub mod error;
pub mod pipeline;
pub mod platform;
pub mod queue;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tracking;
pub mod vision;

pub use error::{Error, Result};
pub use queue::BoundedQueue;
pub use settings::{NoObservationPolicy, Settings};

use glam::Vec2;

/// Game and pipeline configuration constants
pub mod consts {
    use std::time::Duration;

    /// Requested capture resolution and frame rate
    pub const CAPTURE_WIDTH: u32 = 1300;
    pub const CAPTURE_HEIGHT: u32 = 720;
    pub const CAPTURE_FPS: u32 = 60;

    /// Capacity of every queue between stages
    pub const QUEUE_CAPACITY: usize = 3;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Countdown before the simulation starts advancing (seconds)
    pub const START_COUNTDOWN: f32 = 3.0;

    /// Per-frame key poll budget, also paces the game loop
    pub const KEY_POLL: Duration = Duration::from_millis(20);
    /// Quit key code (ESC)
    pub const KEY_ESC: i32 = 27;

    /// Motion detection defaults
    pub const MOTION_THRESHOLD: u8 = 100;
    pub const MIN_POLY_AREA: f64 = 300.0;

    /// Marker color the preprocessing isolates (RGB)
    pub const MARKER_COLOR: [u8; 3] = [0, 0, 0];
    /// Per-channel distance from the marker color still counted as marker
    pub const MARKER_TOLERANCE: u8 = 40;

    /// Resolution the motion mask is computed at
    pub const WORK_WIDTH: u32 = 320;
    pub const WORK_HEIGHT: u32 = 240;
    /// Box blur kernel size applied to the motion mask
    pub const BLUR_KERNEL: u32 = 7;
    /// Douglas-Peucker tolerance for contour simplification
    pub const POLY_EPSILON: f64 = 3.0;

    /// Number of enclosing-rectangle areas kept for the grip heuristic
    pub const GRIP_HISTORY_LEN: usize = 5;
    /// Divisor turning a rectangle area into a coarse bucket
    pub const GRIP_AREA_BUCKET: u32 = 10_000;

    /// Kalman tuning
    pub const KALMAN_PROCESS_NOISE: f32 = 0.1;
    pub const KALMAN_MEASUREMENT_NOISE: f32 = 10.0;
    pub const KALMAN_INITIAL_COVARIANCE: f32 = 0.5;

    /// How long tracking may go without a fresh frame before it warns
    pub const STALE_FRAME_WARN: Duration = Duration::from_secs(1);
}

/// Convert a pixel position into fractions of the frame size
#[inline]
pub fn normalize_point(pos: Vec2, size: (u32, u32)) -> Vec2 {
    Vec2::new(pos.x / size.0 as f32, pos.y / size.1 as f32)
}

/// Convert a normalized position back into pixels for the given frame size
#[inline]
pub fn denormalize_point(pos: Vec2, size: (u32, u32)) -> Vec2 {
    Vec2::new(pos.x * size.0 as f32, pos.y * size.1 as f32)
}
