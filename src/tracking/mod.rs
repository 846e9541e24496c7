//! Marker tracking
//!
//! Smooths per-frame marker observations with a Kalman filter and infers the
//! grip gesture from how the motion's bounding box grows or shrinks.

pub mod kalman;
pub mod marker;

pub use kalman::{FilterPhase, KalmanFilter};
pub use marker::{AreaTrend, Gesture, GripHistory, MarkerTracker};
