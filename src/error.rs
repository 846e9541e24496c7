//! Error taxonomy for the pipeline
//!
//! Queue overflow and missing observations are not errors: the first is
//! silent data loss, the second is handled inside the tracker.

use std::time::SystemTimeError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The capture device could not be opened
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// A frame could not be read from an open device
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),

    /// The time source used for fixed-step pacing is broken
    #[error("cannot get time: {0}")]
    Clock(#[from] SystemTimeError),

    /// Settings JSON did not parse
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),

    /// A worker thread could not be started
    #[error("cannot spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// A worker thread panicked before it could be joined
    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
