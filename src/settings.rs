//! Detector tuning and debug overlay preferences
//!
//! Defaults come from `consts`. An override can be supplied as JSON in the
//! `MARKER_ARKANOID_SETTINGS` environment variable; nothing is written back.

use serde::Deserialize;

use crate::consts::{MIN_POLY_AREA, MOTION_THRESHOLD};
use crate::error::Result;

/// What the tracker feeds its correction step on a cycle without observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum NoObservationPolicy {
    /// Correct against the last observed position again
    #[default]
    RepeatLastObservation,
    /// Skip correction and coast on the motion model
    PredictOnly,
}

/// Pipeline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Motion detection ===
    /// Greyscale level a blurred motion pixel must exceed
    pub motion_threshold: u8,
    /// Contours enclosing less area than this are noise
    pub min_poly_area: f64,

    // === Diagnostic overlay ===
    /// Composite the camera frame
    pub show_background: bool,
    /// Draw simplified contours, their boxes and the enclosing rectangle
    pub show_debug_contours: bool,
    /// Composite the preprocessed (marker mask) frame
    pub show_debug_frame: bool,

    // === Tracking ===
    /// Flip frames horizontally so the paddle follows the hand like a mirror
    pub mirror_input: bool,
    pub no_observation: NoObservationPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            motion_threshold: MOTION_THRESHOLD,
            min_poly_area: MIN_POLY_AREA,

            show_background: true,
            show_debug_contours: true,
            show_debug_frame: false,

            mirror_input: true,
            no_observation: NoObservationPolicy::default(),
        }
    }
}

impl Settings {
    /// Environment variable holding a JSON override
    const ENV_KEY: &'static str = "MARKER_ARKANOID_SETTINGS";

    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from the environment, falling back to defaults
    pub fn load() -> Self {
        match std::env::var(Self::ENV_KEY) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", Self::ENV_KEY);
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring {}: {}", Self::ENV_KEY, e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
