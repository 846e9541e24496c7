//! Frame-differencing motion estimator
//!
//! Each frame is reduced to a marker mask (pixels near the marker color), the
//! previous mask is subtracted from the current one, and the remaining motion
//! is amplified, blurred and thresholded at a small working resolution before
//! being traced into blobs.

use glam::Vec2;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::contours::{BoundingBox, centroid, enclosing_rect, find_blobs};
use super::frame::{
    ColorChannels, add_saturating, box_blur, equalize, isolate_color, resize_nearest, resize_rgb,
    saturating_diff, threshold, to_greyscale,
};
use super::Blob;
use crate::consts::*;
use crate::settings::Settings;

const CONTOUR_COLOR: Rgb<u8> = Rgb([163, 163, 163]);
const ENCLOSING_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// What one frame pair produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Number of blobs that survived area filtering
    pub blob_count: usize,
    /// Centroid of all blob boundaries, normalized to [0, 1]
    pub observation: Option<Vec2>,
    /// Box around all simplified blobs, in display pixels
    pub enclosing_rect: BoundingBox,
}

/// Produces motion blobs and a diagnostic image from consecutive frames.
///
/// Holds at most two preprocessed frames: the previous and the current one.
pub struct MotionEstimator {
    display_size: (u32, u32),
    settings: Settings,
    prev_frame: Option<RgbImage>,
    curr_frame: Option<RgbImage>,
    blobs: Vec<Blob>,
}

impl MotionEstimator {
    pub fn new(display_size: (u32, u32), settings: Settings) -> Self {
        Self {
            display_size,
            settings,
            prev_frame: None,
            curr_frame: None,
            blobs: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Blobs from the most recent frame pair
    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    /// Feed the next raw frame.
    ///
    /// Returns `None` until two frames have been seen.
    pub fn next_frame(&mut self, frame: &RgbImage) -> Option<MotionSample> {
        let curr = isolate_color(frame, MARKER_COLOR, MARKER_TOLERANCE);
        self.prev_frame = match self.curr_frame.take() {
            Some(prev) if prev.dimensions() != curr.dimensions() => {
                log::warn!(
                    "Frame size changed from {:?} to {:?}, restarting",
                    prev.dimensions(),
                    curr.dimensions()
                );
                None
            }
            prev => prev,
        };

        let sample = match &self.prev_frame {
            Some(prev) => {
                let mask = self.amplify_motion(prev, &curr);
                self.blobs = find_blobs(&mask, self.settings.min_poly_area);
                let observation = centroid(&self.blobs)
                    .map(|c| Vec2::new(c.x / mask.width() as f32, c.y / mask.height() as f32));
                log::debug!("{} blobs, observation {:?}", self.blobs.len(), observation);
                Some(MotionSample {
                    blob_count: self.blobs.len(),
                    observation,
                    enclosing_rect: enclosing_rect(
                        &self.blobs,
                        self.display_scale(curr.dimensions()),
                        POLY_EPSILON,
                    ),
                })
            }
            None => {
                self.blobs.clear();
                None
            }
        };

        self.curr_frame = Some(curr);
        sample
    }

    /// Box around all current blobs, in display pixels
    pub fn enclosing_rect(&self) -> BoundingBox {
        enclosing_rect(&self.blobs, self.current_scale(), POLY_EPSILON)
    }

    /// Binary motion mask between two preprocessed frames, at frame size
    fn amplify_motion(&self, prev: &RgbImage, curr: &RgbImage) -> GrayImage {
        let diff = saturating_diff(curr, prev);

        let small = resize_rgb(&diff, WORK_WIDTH, WORK_HEIGHT);
        let amplified = ColorChannels::split(&small).map(|channel| equalize(&channel)).merge();

        let blurred = box_blur(&to_greyscale(&amplified), BLUR_KERNEL);
        let mask = threshold(&blurred, self.settings.motion_threshold);

        resize_nearest(&mask, curr.width(), curr.height())
    }

    fn display_scale(&self, frame_size: (u32, u32)) -> Vec2 {
        Vec2::new(
            self.display_size.0 as f32 / frame_size.0 as f32,
            self.display_size.1 as f32 / frame_size.1 as f32,
        )
    }

    fn current_scale(&self) -> Vec2 {
        self.curr_frame
            .as_ref()
            .map(|f| self.display_scale(f.dimensions()))
            .unwrap_or(Vec2::ONE)
    }

    /// Compose the diagnostic view at display size.
    ///
    /// Layers, each behind its own toggle: the preprocessed frame, the raw
    /// `background` frame, blob outlines with their boxes, and the enclosing
    /// rectangle.
    pub fn diagnostic_image(&self, background: Option<&RgbImage>) -> RgbImage {
        let (width, height) = self.display_size;
        let mut out = RgbImage::new(width, height);

        if self.settings.show_debug_frame {
            if let Some(curr) = &self.curr_frame {
                add_saturating(&mut out, &resize_rgb(curr, width, height));
            }
        }

        if self.settings.show_background {
            if let Some(bg) = background {
                add_saturating(&mut out, &resize_rgb(bg, width, height));
            }
        }

        if self.settings.show_debug_contours {
            self.draw_debug_contours(&mut out);
            draw_box(&mut out, &self.enclosing_rect(), ENCLOSING_COLOR);
        }

        out
    }

    fn draw_debug_contours(&self, out: &mut RgbImage) {
        let scale = self.current_scale();
        for blob in &self.blobs {
            let (poly, bounds) = blob.simplified(scale, POLY_EPSILON);
            for (a, b) in poly.iter().zip(poly.iter().cycle().skip(1)) {
                draw_line_segment_mut(
                    out,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    CONTOUR_COLOR,
                );
            }
            draw_box(out, &bounds, CONTOUR_COLOR);
        }
    }
}

/// Two-pixel outline; empty boxes draw nothing
fn draw_box(out: &mut RgbImage, bb: &BoundingBox, color: Rgb<u8>) {
    if bb.is_empty() {
        return;
    }
    draw_hollow_rect_mut(
        out,
        Rect::at(bb.x, bb.y).of_size(bb.width as u32, bb.height as u32),
        color,
    );
    if bb.width > 2 && bb.height > 2 {
        draw_hollow_rect_mut(
            out,
            Rect::at(bb.x + 1, bb.y + 1).of_size(bb.width as u32 - 2, bb.height as u32 - 2),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgb<u8> = Rgb([200, 200, 200]);
    const MARKER: Rgb<u8> = Rgb([10, 10, 10]);

    fn frame_with_square(x0: u32, y0: u32, side: u32) -> RgbImage {
        RgbImage::from_fn(WORK_WIDTH, WORK_HEIGHT, |x, y| {
            if x >= x0 && x < x0 + side && y >= y0 && y < y0 + side {
                MARKER
            } else {
                BG
            }
        })
    }

    fn estimator() -> MotionEstimator {
        MotionEstimator::new((WORK_WIDTH, WORK_HEIGHT), Settings::default())
    }

    #[test]
    fn test_first_frame_has_no_sample() {
        let mut est = estimator();
        assert!(est.next_frame(&frame_with_square(100, 100, 60)).is_none());
        assert!(est.blobs().is_empty());
    }

    #[test]
    fn test_identical_frames_have_no_motion() {
        let mut est = estimator();
        let frame = frame_with_square(100, 100, 60);
        est.next_frame(&frame);
        for _ in 0..3 {
            let sample = est.next_frame(&frame).unwrap();
            assert_eq!(sample.blob_count, 0);
            assert!(sample.observation.is_none());
            assert!(sample.enclosing_rect.is_empty());
        }
    }

    #[test]
    fn test_moving_square_yields_one_blob_ahead_of_start() {
        let mut est = estimator();
        est.next_frame(&frame_with_square(100, 100, 60));
        let sample = est.next_frame(&frame_with_square(110, 100, 60)).unwrap();

        assert_eq!(sample.blob_count, 1);
        let obs = sample.observation.unwrap();
        let first_center_x = (100.0 + 30.0) / WORK_WIDTH as f32;
        assert!(obs.x > first_center_x, "{} <= {}", obs.x, first_center_x);
        assert!(!sample.enclosing_rect.is_empty());
    }

    #[test]
    fn test_tiny_motion_is_noise() {
        let mut est = estimator();
        est.next_frame(&frame_with_square(100, 100, 8));
        let sample = est.next_frame(&frame_with_square(102, 100, 8)).unwrap();
        assert_eq!(sample.blob_count, 0);
        assert!(sample.observation.is_none());
    }

    #[test]
    fn test_size_change_restarts_pairing() {
        let mut est = estimator();
        est.next_frame(&frame_with_square(100, 100, 60));
        let smaller = RgbImage::from_pixel(WORK_WIDTH / 2, WORK_HEIGHT / 2, BG);
        assert!(est.next_frame(&smaller).is_none());
        assert!(est.next_frame(&smaller).is_some());
    }

    #[test]
    fn test_diagnostic_image_layers() {
        let mut est = estimator();
        est.next_frame(&frame_with_square(100, 100, 60));
        est.next_frame(&frame_with_square(110, 100, 60));

        let bg = frame_with_square(110, 100, 60);
        let image = est.diagnostic_image(Some(&bg));
        assert_eq!(image.dimensions(), (WORK_WIDTH, WORK_HEIGHT));
        assert_eq!(image.get_pixel(5, 5).0, BG.0);

        let rect = est.enclosing_rect();
        let edge = image.get_pixel(rect.x as u32, rect.y as u32 + rect.height as u32 / 2);
        assert_eq!(edge.0[1], 255);

        let hidden = MotionEstimator::new(
            (WORK_WIDTH, WORK_HEIGHT),
            Settings {
                show_background: false,
                show_debug_contours: false,
                ..Settings::default()
            },
        );
        assert_eq!(hidden.diagnostic_image(Some(&bg)).get_pixel(5, 5).0, [0, 0, 0]);
    }

    #[test]
    fn test_full_resolution_frames_scale_to_display() {
        let mut est = MotionEstimator::new((CAPTURE_WIDTH, CAPTURE_HEIGHT), Settings::default());
        let frame = |x0: u32| {
            RgbImage::from_fn(CAPTURE_WIDTH / 2, CAPTURE_HEIGHT / 2, |x, y| {
                if x >= x0 && x < x0 + 120 && y >= 100 && y < 220 {
                    MARKER
                } else {
                    BG
                }
            })
        };
        est.next_frame(&frame(200));
        let sample = est.next_frame(&frame(240)).unwrap();
        assert!(sample.blob_count >= 1);
        // Moving right: motion appears at the leading edge, right of the old center
        assert!(sample.observation.unwrap().x > 260.0 / (CAPTURE_WIDTH / 2) as f32);
        assert!(sample.enclosing_rect.x >= 2 * 240);
    }
}
