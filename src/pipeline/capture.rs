//! Capture stage: reads frames as fast as the device delivers them

use std::sync::Arc;

use super::worker::RunFlag;
use crate::error::Result;
use crate::platform::CaptureSource;
use crate::queue::BoundedQueue;
use crate::vision::Frame;

pub struct CaptureStage<C> {
    source: C,
    frames: Arc<BoundedQueue<Frame>>,
}

impl<C: CaptureSource> CaptureStage<C> {
    pub fn new(source: C, frames: Arc<BoundedQueue<Frame>>) -> Self {
        Self { source, frames }
    }

    /// Read one frame and offer it downstream.
    ///
    /// Returns whether the frame was queued; a full queue drops it.
    pub fn cycle(&mut self) -> Result<bool> {
        let frame = self.source.read_frame()?;
        Ok(self.frames.try_push(frame))
    }

    /// Open the device and capture until stopped or the device fails.
    ///
    /// Failures end this stage only; the rest of the pipeline keeps running
    /// on the last frame it saw.
    pub fn run(mut self, flag: &RunFlag) {
        if let Err(e) = self.source.open() {
            log::warn!("{e}");
            flag.stop();
            return;
        }

        while flag.is_running() {
            if let Err(e) = self.cycle() {
                log::warn!("Capture stopped: {e}");
                break;
            }
        }
        flag.stop();
    }
}
