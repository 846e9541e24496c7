//! Platform abstraction layer
//!
//! Everything the pipeline needs from the outside world sits behind a trait:
//! - Frame acquisition (`CaptureSource`)
//! - Window output and key input (`Display`)
//! - Wall-clock time for fixed-step pacing (`Clock`)
//!
//! Headless and scripted implementations drive the binary and the tests.

pub mod capture;
pub mod clock;
pub mod display;

pub use capture::{CaptureSource, ScriptedCamera, SyntheticCamera};
pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{Display, HeadlessDisplay};
