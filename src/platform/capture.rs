//! Frame sources

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::time::Duration;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{Error, Result};
use crate::vision::Frame;

/// A camera-like device producing frames on demand
pub trait CaptureSource: Send {
    /// Acquire the device. Called once before the first read.
    fn open(&mut self) -> Result<()>;

    /// Block until the next frame is available
    fn read_frame(&mut self) -> Result<Frame>;
}

/// Frames per marker sweep across the image
const SWEEP_FRAMES: f32 = 240.0;
/// Frames per grip cycle (the marker shrinks, then grows back)
const GRIP_FRAMES: f32 = 180.0;

const MARKER_FILL: Rgb<u8> = Rgb([12, 12, 12]);

/// Procedural camera: a dark round marker sweeping left and right over a
/// bright, flickering background, with seeded jitter.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    rng: Pcg32,
    seq: u64,
    opened: bool,
    frame_limit: Option<u64>,
    frame_interval: Option<Duration>,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        Self {
            width,
            height,
            rng: Pcg32::seed_from_u64(seed),
            seq: 0,
            opened: false,
            frame_limit: None,
            frame_interval: None,
        }
    }

    /// Fail reads after `limit` frames, like an unplugged device
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Block each read for one frame period at `fps`
    pub fn paced(mut self, fps: u32) -> Self {
        self.frame_interval = Some(Duration::from_secs_f64(1.0 / fps.max(1) as f64));
        self
    }

    /// Marker center and radius for frame `seq`, before jitter
    pub fn marker_at(&self, seq: u64) -> (f32, f32, f32) {
        let (w, h) = (self.width as f32, self.height as f32);
        let sweep = (seq as f32 / SWEEP_FRAMES * TAU).sin();
        let grip = (seq as f32 / GRIP_FRAMES * TAU).cos();
        let x = w / 2.0 + sweep * w * 0.35;
        let y = h * 0.6;
        let radius = h * 0.08 * (1.0 + 0.3 * grip);
        (x, y, radius)
    }

    fn render(&mut self) -> RgbImage {
        let level = self.rng.random_range(180..=205u8);
        let mut image = RgbImage::from_pixel(self.width, self.height, Rgb([level; 3]));

        let (x, y, radius) = self.marker_at(self.seq);
        let jx = self.rng.random_range(-2.0f32..2.0);
        let jy = self.rng.random_range(-2.0f32..2.0);
        draw_filled_circle_mut(
            &mut image,
            ((x + jx) as i32, (y + jy) as i32),
            radius as i32,
            MARKER_FILL,
        );
        image
    }
}

impl CaptureSource for SyntheticCamera {
    fn open(&mut self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::CameraUnavailable(format!(
                "cannot synthesize {}x{} frames",
                self.width, self.height
            )));
        }
        self.opened = true;
        log::info!("Synthetic camera {}x{} opened", self.width, self.height);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        if !self.opened {
            return Err(Error::CaptureFailed("camera not opened".into()));
        }
        if self.frame_limit.is_some_and(|limit| self.seq >= limit) {
            return Err(Error::CaptureFailed(format!(
                "stream ended after {} frames",
                self.seq
            )));
        }
        if let Some(interval) = self.frame_interval {
            std::thread::sleep(interval);
        }

        let frame = Frame::new(self.seq, self.render());
        self.seq += 1;
        Ok(frame)
    }
}

/// Replays a fixed list of frames, then reports the stream as broken
pub struct ScriptedCamera {
    frames: VecDeque<RgbImage>,
    seq: u64,
    available: bool,
}

impl ScriptedCamera {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            seq: 0,
            available: true,
        }
    }

    /// A camera that cannot be opened
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new([])
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl CaptureSource for ScriptedCamera {
    fn open(&mut self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(Error::CameraUnavailable("no scripted device".into()))
        }
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let image = self
            .frames
            .pop_front()
            .ok_or_else(|| Error::CaptureFailed("script exhausted".into()))?;
        let frame = Frame::new(self.seq, image);
        self.seq += 1;
        Ok(frame)
    }
}
