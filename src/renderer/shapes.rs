//! Raster primitives for game objects

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

use crate::sim::{Aabb, Ball};

/// Fill a box, clipped to the image; zero-sized boxes draw nothing
pub fn fill_box(image: &mut RgbImage, rect: &Aabb, color: Rgb<u8>) {
    let width = rect.width.round() as i64;
    let height = rect.height.round() as i64;
    if width <= 0 || height <= 0 {
        return;
    }
    draw_filled_rect_mut(
        image,
        Rect::at(rect.x.round() as i32, rect.y.round() as i32).of_size(width as u32, height as u32),
        color,
    );
}

pub fn fill_ball(image: &mut RgbImage, ball: &Ball, color: Rgb<u8>) {
    draw_filled_circle_mut(
        image,
        (ball.pos.x.round() as i32, ball.pos.y.round() as i32),
        ball.radius.round() as i32,
        color,
    );
}
