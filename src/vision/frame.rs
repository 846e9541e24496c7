//! Frames and the per-pixel operations the motion estimator is built from

use image::imageops;
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};
use imageproc::contrast::ThresholdType;
use imageproc::map::map_colors;

/// A captured camera frame.
///
/// Immutable once captured; moved through the queues so exactly one stage
/// owns it at a time.
#[derive(Debug, Clone)]
pub struct Frame {
    seq: u64,
    image: RgbImage,
}

impl Frame {
    pub fn new(seq: u64, image: RgbImage) -> Self {
        Self { seq, image }
    }

    /// Capture sequence number (monotonic per capture source)
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Flip left/right so the picture reads like a mirror
    pub fn mirrored(mut self) -> Self {
        imageops::flip_horizontal_in_place(&mut self.image);
        self
    }
}

/// The three color planes of an RGB image
#[derive(Debug, Clone)]
pub struct ColorChannels {
    pub red: GrayImage,
    pub green: GrayImage,
    pub blue: GrayImage,
}

impl ColorChannels {
    pub fn split(image: &RgbImage) -> Self {
        let plane = |c: usize| {
            GrayImage::from_fn(image.width(), image.height(), |x, y| {
                Luma([image.get_pixel(x, y)[c]])
            })
        };
        Self {
            red: plane(0),
            green: plane(1),
            blue: plane(2),
        }
    }

    /// Apply the same operation to every plane
    pub fn map(self, mut f: impl FnMut(GrayImage) -> GrayImage) -> Self {
        Self {
            red: f(self.red),
            green: f(self.green),
            blue: f(self.blue),
        }
    }

    /// Recombine the planes; they must share dimensions
    pub fn merge(&self) -> RgbImage {
        RgbImage::from_fn(self.red.width(), self.red.height(), |x, y| {
            Rgb([
                self.red.get_pixel(x, y)[0],
                self.green.get_pixel(x, y)[0],
                self.blue.get_pixel(x, y)[0],
            ])
        })
    }
}

/// Mark pixels close to `color` as foreground.
///
/// Each channel is compared independently: 255 where the channel is within
/// `tolerance` of the reference, 0 elsewhere.
pub fn isolate_color(image: &RgbImage, color: [u8; 3], tolerance: u8) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for (value, reference) in pixel.0.iter_mut().zip(color) {
            *value = if value.abs_diff(reference) > tolerance { 0 } else { 255 };
        }
    }
    out
}

/// Per-channel `curr - prev`, clamped at zero
pub fn saturating_diff(curr: &RgbImage, prev: &RgbImage) -> RgbImage {
    let mut out = curr.clone();
    for (pixel, before) in out.pixels_mut().zip(prev.pixels()) {
        for (value, b) in pixel.0.iter_mut().zip(before.0) {
            *value = value.saturating_sub(b);
        }
    }
    out
}

/// Per-channel saturating `dst += src`; sizes must match
pub fn add_saturating(dst: &mut RgbImage, src: &RgbImage) {
    for (pixel, add) in dst.pixels_mut().zip(src.pixels()) {
        for (value, a) in pixel.0.iter_mut().zip(add.0) {
            *value = value.saturating_add(a);
        }
    }
}

/// Histogram equalization.
///
/// The darkest occupied level maps to 0 and the remaining levels are spread
/// by cumulative count over the rest of the range, so a two-level mask stays
/// a two-level mask. A single-level image is returned unchanged.
pub fn equalize(image: &GrayImage) -> GrayImage {
    let mut hist = [0u64; 256];
    for p in image.pixels() {
        hist[p[0] as usize] += 1;
    }
    let total: u64 = hist.iter().sum();
    let Some(first) = hist.iter().position(|&h| h > 0) else {
        return image.clone();
    };
    if hist[first] == total {
        return image.clone();
    }

    let scale = 255.0 / (total - hist[first]) as f64;
    let mut lut = [0u8; 256];
    let mut sum = 0u64;
    for level in first + 1..256 {
        sum += hist[level];
        lut[level] = (sum as f64 * scale).round().min(255.0) as u8;
    }

    let mut out = image.clone();
    for p in out.pixels_mut() {
        p[0] = lut[p[0] as usize];
    }
    out
}

/// Luma with BT.601 weights (0.299, 0.587, 0.114), rounded
pub fn to_greyscale(image: &RgbImage) -> GrayImage {
    map_colors(image, |Rgb([r, g, b])| {
        let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// Binary threshold: 255 strictly above `level`, 0 otherwise
pub fn threshold(image: &GrayImage, level: u8) -> GrayImage {
    imageproc::contrast::threshold(image, level, ThresholdType::Binary)
}

/// Mean filter over a `kernel`×`kernel` window
pub fn box_blur(image: &GrayImage, kernel: u32) -> GrayImage {
    let radius = kernel / 2;
    imageproc::filter::box_filter(image, radius, radius)
}

/// Nearest-neighbour resize by direct index mapping.
///
/// Every output pixel is a copy of one source pixel, so a binary mask stays
/// binary.
pub fn resize_nearest<P: Pixel>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (width, height) {
        return image.clone();
    }
    if src_w == 0 || src_h == 0 {
        return ImageBuffer::new(width, height);
    }
    let map = |i: u32, src: u32, dst: u32| (u64::from(i) * u64::from(src) / u64::from(dst)) as u32;
    ImageBuffer::from_fn(width, height, |x, y| {
        *image.get_pixel(map(x, src_w, width), map(y, src_h, height))
    })
}

/// Area-averaging shrink; larger targets fall back to nearest neighbour
pub fn resize_rgb(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (width, height) {
        image.clone()
    } else if width <= src_w && height <= src_h {
        imageops::thumbnail(image, width, height)
    } else {
        resize_nearest(image, width, height)
    }
}
