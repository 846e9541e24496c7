//! Smoothed marker position and grip gesture state

use std::collections::VecDeque;

use glam::Vec2;

use super::kalman::KalmanFilter;
use crate::consts::{GRIP_AREA_BUCKET, GRIP_HISTORY_LEN};
use crate::settings::NoObservationPolicy;
use crate::vision::BoundingBox;
use crate::{denormalize_point, normalize_point};

/// Trend of the recent enclosing-rectangle areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaTrend {
    /// Never shrinks (a constant run counts here)
    Ascending,
    /// Never grows
    Descending,
    Mixed,
}

/// Gesture applied by the grip heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Grip,
    Release,
}

/// Ring of the most recent area buckets, oldest first
#[derive(Debug, Clone, Default)]
pub struct GripHistory {
    areas: VecDeque<i32>,
}

impl GripHistory {
    pub fn new() -> Self {
        Self {
            areas: VecDeque::with_capacity(GRIP_HISTORY_LEN + 1),
        }
    }

    /// Append a bucket, evicting the oldest beyond capacity
    pub fn push(&mut self, bucket: i32) {
        self.areas.push_back(bucket);
        if self.areas.len() > GRIP_HISTORY_LEN {
            self.areas.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &i32> {
        self.areas.iter()
    }

    pub fn trend(&self) -> AreaTrend {
        let pairs = || self.areas.iter().zip(self.areas.iter().skip(1));
        if pairs().all(|(a, b)| b >= a) {
            AreaTrend::Ascending
        } else if pairs().all(|(a, b)| b <= a) {
            AreaTrend::Descending
        } else {
            AreaTrend::Mixed
        }
    }
}

/// Kalman-smoothed marker position plus grip state.
///
/// `last_position` only changes on an observation; the filter changes every
/// cycle. Owned by the tracking stage alone.
#[derive(Debug, Clone)]
pub struct MarkerTracker {
    /// Last raw observation, normalized
    last_position: Vec2,
    filter: KalmanFilter,
    gripped: bool,
    grip_history: GripHistory,
    prev_enclosing: BoundingBox,
    policy: NoObservationPolicy,
}

impl MarkerTracker {
    pub fn new(policy: NoObservationPolicy) -> Self {
        Self {
            last_position: Vec2::ZERO,
            filter: KalmanFilter::default(),
            gripped: false,
            grip_history: GripHistory::new(),
            prev_enclosing: BoundingBox::default(),
            policy,
        }
    }

    /// Correct the filter with a normalized observation
    pub fn observe(&mut self, position: Vec2) {
        self.last_position = position;
        self.filter.correct(position.x, position.y);
    }

    /// Convenience for observations in pixels of a frame of `frame_size`
    pub fn observe_pixels(&mut self, position: Vec2, frame_size: (u32, u32)) {
        self.observe(normalize_point(position, frame_size));
    }

    /// Cycle without an observation
    pub fn tick(&mut self) {
        match self.policy {
            NoObservationPolicy::RepeatLastObservation => {
                self.filter.correct(self.last_position.x, self.last_position.y);
            }
            NoObservationPolicy::PredictOnly => self.filter.coast(),
        }
    }

    /// Run the filter's predict step and return the result in pixels.
    ///
    /// Advances the filter; a second call before the next `observe`/`tick`
    /// returns the same prediction.
    pub fn predicted_position(&mut self, frame_size: (u32, u32)) -> Vec2 {
        let (x, y) = self.filter.predict();
        denormalize_point(Vec2::new(x, y), frame_size)
    }

    /// Last raw observation in pixels
    pub fn last_position(&self, frame_size: (u32, u32)) -> Vec2 {
        denormalize_point(self.last_position, frame_size)
    }

    pub fn grip(&mut self) {
        self.gripped = true;
    }

    pub fn release(&mut self) {
        self.gripped = false;
    }

    pub fn has_grip(&self) -> bool {
        self.gripped
    }

    pub fn grip_history(&self) -> &GripHistory {
        &self.grip_history
    }

    /// Update the grip state from this cycle's enclosing rectangle.
    ///
    /// Records the rectangle's area bucket when `marker_pos` lies in the
    /// current or the previous rectangle, then grips on a shrinking run and
    /// releases on a growing one. Returns the gesture applied, if any.
    pub fn detect_grip(&mut self, marker_pos: Vec2, enclosing: BoundingBox) -> Option<Gesture> {
        let mut applied = None;
        if self.prev_enclosing.contains(marker_pos) || enclosing.contains(marker_pos) {
            self.grip_history
                .push(enclosing.area() / GRIP_AREA_BUCKET as i32);

            applied = match self.grip_history.trend() {
                AreaTrend::Ascending => {
                    self.release();
                    Some(Gesture::Release)
                }
                AreaTrend::Descending => {
                    self.grip();
                    Some(Gesture::Grip)
                }
                AreaTrend::Mixed => None,
            };
        }
        self.prev_enclosing = enclosing;
        applied
    }
}

impl Default for MarkerTracker {
    fn default() -> Self {
        Self::new(NoObservationPolicy::default())
    }
}
