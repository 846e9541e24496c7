//! Three-stage pipeline
//!
//! Capture and tracking each run on a worker thread; the game loop runs on
//! the caller's thread (the one that owns the window). Stages talk only
//! through lossy bounded queues:
//!
//! ```text
//! capture --Frame--> tracking --diagnostic image--> game loop
//!                             --paddle position---> game loop
//! ```

pub mod capture;
pub mod game_loop;
pub mod tracking;
pub mod worker;

pub use capture::CaptureStage;
pub use game_loop::{GameLoopStage, LoopControl};
pub use tracking::{TrackingReport, TrackingStage};
pub use worker::{RunFlag, Worker};

use std::sync::Arc;

use glam::Vec2;
use image::RgbImage;

use crate::consts::QUEUE_CAPACITY;
use crate::error::Result;
use crate::platform::{CaptureSource, Clock, Display};
use crate::queue::BoundedQueue;
use crate::settings::Settings;
use crate::vision::Frame;

/// Paddle steering input: the predicted marker position in display pixels
pub type ControlSignal = Vec2;

/// Running capture and tracking workers plus the queues between stages
pub struct Pipeline {
    display_size: (u32, u32),
    images: Arc<BoundedQueue<Arc<RgbImage>>>,
    positions: Arc<BoundedQueue<ControlSignal>>,
    capture: Worker,
    tracking: Worker,
}

impl Pipeline {
    /// Wire the queues and start the capture and tracking workers
    pub fn start<C>(camera: C, display_size: (u32, u32), settings: Settings) -> Result<Self>
    where
        C: CaptureSource + 'static,
    {
        let frames = Arc::new(BoundedQueue::<Frame>::new(QUEUE_CAPACITY));
        let images = Arc::new(BoundedQueue::new(QUEUE_CAPACITY));
        let positions = Arc::new(BoundedQueue::new(QUEUE_CAPACITY));

        let capture_stage = CaptureStage::new(camera, Arc::clone(&frames));
        let tracking_stage = TrackingStage::new(
            frames,
            Arc::clone(&images),
            Arc::clone(&positions),
            display_size,
            settings,
        );

        let capture = Worker::spawn("capture", move |flag| capture_stage.run(flag))?;
        let tracking = Worker::spawn("tracking", move |flag| tracking_stage.run(flag))?;

        Ok(Self {
            display_size,
            images,
            positions,
            capture,
            tracking,
        })
    }

    pub fn capture_running(&self) -> bool {
        self.capture.is_running()
    }

    pub fn tracking_running(&self) -> bool {
        self.tracking.is_running()
    }

    /// Run the game loop on this thread until the player quits, `stop` is
    /// cleared or the clock fails, then shut the workers down.
    ///
    /// Hands the display back on a clean exit.
    pub fn run<D, K>(self, display: D, clock: K, stop: &RunFlag) -> Result<D>
    where
        D: Display,
        K: Clock,
    {
        let mut game_loop = GameLoopStage::new(
            Arc::clone(&self.positions),
            Arc::clone(&self.images),
            self.display_size,
            display,
            clock,
        );
        let result = game_loop.run(stop);
        let shutdown = self.shutdown();

        result?;
        shutdown?;
        Ok(game_loop.into_display())
    }

    /// Stop both workers and wait for them
    pub fn shutdown(self) -> Result<()> {
        self.capture.stop();
        self.tracking.stop();
        let capture = self.capture.join();
        let tracking = self.tracking.join();
        capture.and(tracking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{CAPTURE_HEIGHT, CAPTURE_WIDTH};
    use crate::error::Error;
    use crate::platform::{HeadlessDisplay, ManualClock, ScriptedCamera, SyntheticCamera};
    use image::Rgb;
    use std::time::{Duration, Instant};

    const DISPLAY: (u32, u32) = (CAPTURE_WIDTH, CAPTURE_HEIGHT);

    fn clock() -> ManualClock {
        ManualClock::new(Duration::from_millis(16))
    }

    fn sweep(frames: u32) -> Vec<RgbImage> {
        (0..frames)
            .map(|i| {
                let x0 = 100 + i * 12;
                RgbImage::from_fn(DISPLAY.0 / 2, DISPLAY.1 / 2, |x, y| {
                    if x >= x0 && x < x0 + 80 && y >= 120 && y < 200 {
                        Rgb([10, 10, 10])
                    } else {
                        Rgb([200, 200, 200])
                    }
                })
            })
            .collect()
    }

    /// Marker shaking in place on the left of the camera picture
    fn shuttle(frames: u32) -> Vec<RgbImage> {
        (0..frames)
            .map(|i| {
                let x0 = 100 + (i % 2) * 24;
                RgbImage::from_fn(DISPLAY.0 / 2, DISPLAY.1 / 2, |x, y| {
                    if x >= x0 && x < x0 + 80 && y >= 120 && y < 200 {
                        Rgb([10, 10, 10])
                    } else {
                        Rgb([200, 200, 200])
                    }
                })
            })
            .collect()
    }

    #[test]
    fn test_shutdown_joins_workers_promptly() {
        let camera = SyntheticCamera::new(160, 90, 3).paced(60);
        let pipeline = Pipeline::start(camera, (160, 90), Settings::default()).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(pipeline.capture_running());
        assert!(pipeline.tracking_running());

        let start = Instant::now();
        pipeline.shutdown().unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_scripted_session_runs_to_quit() {
        let pipeline =
            Pipeline::start(ScriptedCamera::new(sweep(12)), DISPLAY, Settings::default()).unwrap();
        let stop = RunFlag::new();
        let display = pipeline
            .run(HeadlessDisplay::quit_after(30), clock(), &stop)
            .unwrap();

        assert_eq!(display.frames_shown(), 30);
        assert_eq!(display.last_frame().unwrap().dimensions(), DISPLAY);
        assert!(!stop.is_running());
    }

    #[test]
    fn test_marker_steers_paddle_to_mirrored_side() {
        let frames = Arc::new(BoundedQueue::new(QUEUE_CAPACITY));
        let images = Arc::new(BoundedQueue::new(QUEUE_CAPACITY));
        let positions = Arc::new(BoundedQueue::new(QUEUE_CAPACITY));
        let mut capture = CaptureStage::new(ScriptedCamera::new(shuttle(40)), Arc::clone(&frames));
        let mut tracking = TrackingStage::new(
            frames,
            Arc::clone(&images),
            Arc::clone(&positions),
            DISPLAY,
            Settings::default(),
        );
        let mut game_loop =
            GameLoopStage::new(positions, images, DISPLAY, HeadlessDisplay::new(), clock());

        // One cycle of each stage per frame so nothing is dropped
        game_loop.start().unwrap();
        while capture.cycle().is_ok() {
            tracking.cycle();
            game_loop.cycle().unwrap();
        }
        assert_eq!(game_loop.display().frames_shown(), 40);

        // The marker is left of center in the camera picture, so right of
        // center once mirrored
        let center_x = game_loop.game().paddle.center_x();
        assert!(center_x > 850.0, "paddle at {center_x}");

        let shown = game_loop.display().last_frame().unwrap();
        let paddle: Vec<u32> = (0..DISPLAY.0)
            .filter(|&x| shown.get_pixel(x, 705).0 == [255, 255, 255])
            .collect();
        assert!(!paddle.is_empty());
        let drawn_x = paddle.iter().sum::<u32>() as f32 / paddle.len() as f32;
        assert!(drawn_x > 800.0, "paddle drawn at {drawn_x}");
    }

    #[test]
    fn test_capture_failure_leaves_game_running() {
        let pipeline =
            Pipeline::start(ScriptedCamera::unavailable(), DISPLAY, Settings::default()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);
        while pipeline.capture_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(!pipeline.capture_running());
        assert!(pipeline.tracking_running());

        let display = pipeline
            .run(HeadlessDisplay::quit_after(5), clock(), &RunFlag::new())
            .unwrap();
        assert_eq!(display.frames_shown(), 5);
    }

    #[test]
    fn test_clock_failure_is_surfaced() {
        let pipeline =
            Pipeline::start(ScriptedCamera::new(sweep(4)), DISPLAY, Settings::default()).unwrap();
        let broken = clock().jump_back_at(2, Duration::from_secs(10));
        let result = pipeline.run(HeadlessDisplay::new(), broken, &RunFlag::new());
        assert!(matches!(result, Err(Error::Clock(_))));
    }
}
