//! Output window and key input

use std::time::Duration;

use image::RgbImage;

use crate::consts::KEY_ESC;

/// Where composed frames go and where key presses come from
pub trait Display {
    fn show(&mut self, image: &RgbImage);

    /// Wait up to `timeout` for a key press
    fn poll_key(&mut self, timeout: Duration) -> Option<i32>;
}

/// Display without a window. Keeps the last frame and can press ESC on its
/// own after a number of frames.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    frames_shown: u64,
    quit_after: Option<u64>,
    last_frame: Option<RgbImage>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report ESC once `frames` frames have been shown
    pub fn quit_after(frames: u64) -> Self {
        Self {
            quit_after: Some(frames),
            ..Self::default()
        }
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    pub fn last_frame(&self) -> Option<&RgbImage> {
        self.last_frame.as_ref()
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, image: &RgbImage) {
        self.frames_shown += 1;
        match &mut self.last_frame {
            Some(last) => last.clone_from(image),
            None => self.last_frame = Some(image.clone()),
        }
    }

    fn poll_key(&mut self, timeout: Duration) -> Option<i32> {
        std::thread::sleep(timeout);
        self.quit_after
            .is_some_and(|limit| self.frames_shown >= limit)
            .then_some(KEY_ESC)
    }
}
