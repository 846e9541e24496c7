//! Tracking stage: frames in, diagnostic images and paddle positions out

use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;

use super::ControlSignal;
use super::worker::RunFlag;
use crate::consts::STALE_FRAME_WARN;
use crate::queue::BoundedQueue;
use crate::settings::Settings;
use crate::tracking::{Gesture, MarkerTracker};
use crate::vision::{Frame, MotionEstimator, MotionSample};

/// What a single tracking cycle did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingReport {
    /// A new frame was taken from the capture queue
    pub fresh_frame: bool,
    /// Motion found in the frame pair, if a pair was available
    pub sample: Option<MotionSample>,
    pub gesture: Option<Gesture>,
    /// Position offered to the game loop this cycle
    pub position: Option<ControlSignal>,
    /// Consecutive cycles without a fresh frame
    pub stale_cycles: u64,
}

pub struct TrackingStage {
    frames: Arc<BoundedQueue<Frame>>,
    images: Arc<BoundedQueue<Arc<RgbImage>>>,
    positions: Arc<BoundedQueue<ControlSignal>>,
    estimator: MotionEstimator,
    tracker: MarkerTracker,
    display_size: (u32, u32),
    mirror: bool,
    diagnostic: Option<Arc<RgbImage>>,
    position: Option<ControlSignal>,
    stale_cycles: u64,
    last_frame_at: Instant,
    stall_reported: bool,
}

impl TrackingStage {
    pub fn new(
        frames: Arc<BoundedQueue<Frame>>,
        images: Arc<BoundedQueue<Arc<RgbImage>>>,
        positions: Arc<BoundedQueue<ControlSignal>>,
        display_size: (u32, u32),
        settings: Settings,
    ) -> Self {
        Self {
            frames,
            images,
            positions,
            tracker: MarkerTracker::new(settings.no_observation),
            mirror: settings.mirror_input,
            estimator: MotionEstimator::new(display_size, settings),
            display_size,
            diagnostic: None,
            position: None,
            stale_cycles: 0,
            last_frame_at: Instant::now(),
            stall_reported: false,
        }
    }

    pub fn tracker(&self) -> &MarkerTracker {
        &self.tracker
    }

    /// Process the newest frame if there is one, then republish the latest
    /// diagnostic image and position. Never blocks.
    pub fn cycle(&mut self) -> TrackingReport {
        let mut report = TrackingReport {
            fresh_frame: false,
            sample: None,
            gesture: None,
            position: None,
            stale_cycles: 0,
        };

        match self.frames.try_pop() {
            Some(frame) => {
                self.mark_fresh();
                let frame = if self.mirror { frame.mirrored() } else { frame };
                report.fresh_frame = true;
                report.sample = self.estimator.next_frame(frame.image());
                if let Some(sample) = report.sample {
                    report.gesture = self.track(sample);
                }
                let diagnostic = self.estimator.diagnostic_image(Some(frame.image()));
                self.diagnostic = Some(Arc::new(diagnostic));
            }
            None => self.mark_stale(),
        }

        if let Some(image) = &self.diagnostic {
            self.images.try_push(Arc::clone(image));
        }
        if let Some(position) = self.position {
            self.positions.try_push(position);
        }

        report.position = self.position;
        report.stale_cycles = self.stale_cycles;
        report
    }

    /// Publish the prediction for this cycle, check for a gesture against
    /// it, then feed the filter.
    fn track(&mut self, sample: MotionSample) -> Option<Gesture> {
        let predicted = self.tracker.predicted_position(self.display_size);

        let gesture = if sample.blob_count > 0 {
            self.tracker.detect_grip(predicted, sample.enclosing_rect)
        } else {
            None
        };
        if let Some(gesture) = gesture {
            log::debug!("{gesture:?} at {predicted}");
        }

        match sample.observation {
            Some(observation) => self.tracker.observe(observation),
            None => self.tracker.tick(),
        }

        self.position = Some(predicted);
        gesture
    }

    fn mark_fresh(&mut self) {
        if self.stall_reported {
            log::info!("Frames resumed after {} idle cycles", self.stale_cycles);
        }
        self.stale_cycles = 0;
        self.stall_reported = false;
        self.last_frame_at = Instant::now();
    }

    fn mark_stale(&mut self) {
        self.stale_cycles += 1;
        if !self.stall_reported && self.last_frame_at.elapsed() >= STALE_FRAME_WARN {
            log::warn!(
                "No new frame for {:.1}s, reusing the last one",
                self.last_frame_at.elapsed().as_secs_f32()
            );
            self.stall_reported = true;
        }
    }

    pub fn run(mut self, flag: &RunFlag) {
        while flag.is_running() {
            if !self.cycle().fresh_frame {
                std::thread::yield_now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const W: u32 = 320;
    const H: u32 = 240;

    struct Queues {
        frames: Arc<BoundedQueue<Frame>>,
        images: Arc<BoundedQueue<Arc<RgbImage>>>,
        positions: Arc<BoundedQueue<ControlSignal>>,
    }

    fn stage(settings: Settings) -> (TrackingStage, Queues) {
        let queues = Queues {
            frames: Arc::new(BoundedQueue::new(8)),
            images: Arc::new(BoundedQueue::new(8)),
            positions: Arc::new(BoundedQueue::new(8)),
        };
        let stage = TrackingStage::new(
            Arc::clone(&queues.frames),
            Arc::clone(&queues.images),
            Arc::clone(&queues.positions),
            (W, H),
            settings,
        );
        (stage, queues)
    }

    fn square_at(seq: u64, x0: u32) -> Frame {
        let image = RgbImage::from_fn(W, H, |x, y| {
            if x >= x0 && x < x0 + 60 && y >= 100 && y < 160 {
                Rgb([10, 10, 10])
            } else {
                Rgb([200, 200, 200])
            }
        });
        Frame::new(seq, image)
    }

    fn unmirrored() -> Settings {
        Settings {
            mirror_input: false,
            ..Settings::default()
        }
    }

    #[test]
    fn test_idle_cycle_publishes_nothing() {
        let (mut stage, queues) = stage(Settings::default());
        let report = stage.cycle();
        assert!(!report.fresh_frame);
        assert_eq!(report.stale_cycles, 1);
        assert!(report.position.is_none());
        assert!(queues.images.is_empty());
        assert!(queues.positions.is_empty());
    }

    #[test]
    fn test_first_frame_publishes_image_only() {
        let (mut stage, queues) = stage(unmirrored());
        queues.frames.try_push(square_at(0, 100));

        let report = stage.cycle();
        assert!(report.fresh_frame);
        assert!(report.sample.is_none());
        assert_eq!(queues.images.len(), 1);
        assert!(queues.positions.is_empty());
    }

    #[test]
    fn test_motion_publishes_position() {
        let (mut stage, queues) = stage(unmirrored());
        queues.frames.try_push(square_at(0, 100));
        queues.frames.try_push(square_at(1, 110));

        stage.cycle();
        let report = stage.cycle();
        let sample = report.sample.unwrap();
        assert_eq!(sample.blob_count, 1);
        // Published before the observation is fed in, so it starts at the origin
        assert_eq!(report.position, Some(ControlSignal::ZERO));
        assert_eq!(queues.positions.len(), 1);

        queues.frames.try_push(square_at(2, 120));
        let next = stage.cycle();
        assert!(next.position.unwrap().x > 0.0);
    }

    #[test]
    fn test_still_frames_leave_position_unchanged() {
        let (mut stage, queues) = stage(unmirrored());
        for seq in 0..4 {
            queues.frames.try_push(square_at(seq, 100));
        }
        stage.cycle();
        for _ in 0..3 {
            let report = stage.cycle();
            assert_eq!(report.sample.unwrap().blob_count, 0);
            assert!(report.gesture.is_none());
            assert_eq!(report.position, Some(ControlSignal::ZERO));
        }
    }

    #[test]
    fn test_stale_cycles_reuse_last_outputs() {
        let (mut stage, queues) = stage(unmirrored());
        queues.frames.try_push(square_at(0, 100));
        queues.frames.try_push(square_at(1, 110));
        stage.cycle();
        let fresh = stage.cycle();
        while queues.images.try_pop().is_some() {}
        while queues.positions.try_pop().is_some() {}

        let first = stage.cycle();
        let second = stage.cycle();
        assert_eq!(first.stale_cycles, 1);
        assert_eq!(second.stale_cycles, 2);
        assert_eq!(second.position, fresh.position);

        let a = queues.images.try_pop().unwrap();
        let b = queues.images.try_pop().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(queues.positions.try_pop(), fresh.position);

        queues.frames.try_push(square_at(2, 110));
        assert_eq!(stage.cycle().stale_cycles, 0);
    }

    #[test]
    fn test_mirrored_input_flips_motion() {
        let (mut plain, plain_queues) = stage(unmirrored());
        let (mut mirrored, mirrored_queues) = stage(Settings::default());
        for (seq, x) in [(0, 40), (1, 50)] {
            plain_queues.frames.try_push(square_at(seq, x));
            mirrored_queues.frames.try_push(square_at(seq, x));
        }
        plain.cycle();
        mirrored.cycle();
        let a = plain.cycle().sample.unwrap().observation.unwrap();
        let b = mirrored.cycle().sample.unwrap().observation.unwrap();
        assert!(a.x < 0.5);
        assert!(b.x > 0.5);
    }
}
