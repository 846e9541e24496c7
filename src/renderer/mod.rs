//! Software rendering of the simulation
//!
//! Draws the game over whatever the tracking stage last produced: the ball
//! and paddle are painted in, the block layer is added on top.

pub mod shapes;

use image::{Rgb, RgbImage};

use crate::sim::{BlockGrid, Game};
use crate::vision::frame::add_saturating;

const BLOCK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BALL_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const PADDLE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Composite the game onto `image` in place
pub fn render_onto(game: &Game, image: &mut RgbImage) {
    let mut board = RgbImage::new(image.width(), image.height());
    for (column, row, _) in game.blocks.iter() {
        shapes::fill_box(&mut board, &BlockGrid::rect_for(column, row), BLOCK_COLOR);
    }

    shapes::fill_ball(image, &game.ball, BALL_COLOR);
    shapes::fill_box(image, &game.paddle.rect, PADDLE_COLOR);
    add_saturating(image, &board);
}
