//! Motion detection
//!
//! Turns raw camera frames into blobs of motion, a single marker observation
//! per frame pair, and a diagnostic overlay. No tracking state lives here
//! beyond the previous frame.

pub mod contours;
pub mod frame;
pub mod motion;

pub use contours::{Blob, BoundingBox, centroid, enclosing_rect, find_blobs};
pub use frame::{ColorChannels, Frame};
pub use motion::{MotionEstimator, MotionSample};
