//! Game state and core simulation types

use glam::Vec2;

use super::collision::Aabb;

/// Ball defaults
pub const BALL_SPEED: f32 = 250.0;
pub const BALL_RADIUS: f32 = 10.0;
/// Ball spawns this far below the board center
pub const BALL_SPAWN_OFFSET: f32 = 40.0;

/// Paddle defaults
pub const PADDLE_WIDTH: f32 = 400.0;
pub const PADDLE_HEIGHT: f32 = 30.0;

/// Block cell size; blocks fill the top half of the board
pub const BLOCK_WIDTH: u32 = 100;
pub const BLOCK_HEIGHT: u32 = 60;

/// A ball entity
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Ball {
    /// Fresh ball below the board center, falling toward the paddle
    pub fn spawn(board_width: u32, board_height: u32) -> Self {
        Self {
            pos: Vec2::new(
                board_width as f32 / 2.0,
                board_height as f32 / 2.0 + BALL_SPAWN_OFFSET,
            ),
            vel: Vec2::new(0.0, BALL_SPEED),
            radius: BALL_RADIUS,
        }
    }
}

/// The player's paddle, resting on the bottom edge
#[derive(Debug, Clone, PartialEq)]
pub struct Paddle {
    pub rect: Aabb,
}

impl Paddle {
    pub fn new(board_width: u32, board_height: u32) -> Self {
        Self {
            rect: Aabb::new(
                board_width as f32 / 2.0 - PADDLE_WIDTH / 2.0,
                board_height as f32 - PADDLE_HEIGHT,
                PADDLE_WIDTH,
                PADDLE_HEIGHT,
            ),
        }
    }

    /// Center the paddle horizontally on `x`
    pub fn set_center_x(&mut self, x: f32) {
        self.rect.x = x - self.rect.width / 2.0;
    }

    pub fn center_x(&self) -> f32 {
        self.rect.x + self.rect.width / 2.0
    }
}

/// Grid of breakable blocks, column-major lookups by (column, row)
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGrid {
    pub columns: u32,
    pub rows: u32,
    cells: Vec<bool>,
}

impl BlockGrid {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            cells: vec![false; (columns * rows) as usize],
        }
    }

    fn index(&self, column: u32, row: u32) -> usize {
        debug_assert!(column < self.columns && row < self.rows);
        (column + row * self.columns) as usize
    }

    /// Place a block on every even column of every even row
    pub fn fill_alternating(&mut self) {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let idx = self.index(column, row);
                self.cells[idx] = column % 2 == 0 && row % 2 == 0;
            }
        }
    }

    pub fn is_present(&self, column: u32, row: u32) -> bool {
        self.cells[self.index(column, row)]
    }

    pub fn remove(&mut self, column: u32, row: u32) {
        let idx = self.index(column, row);
        self.cells[idx] = false;
    }

    pub fn remaining(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Present blocks in row-major order with their rectangles
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Aabb)> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.columns)
                .filter(move |&column| self.is_present(column, row))
                .map(move |column| (column, row, Self::rect_for(column, row)))
        })
    }

    pub fn rect_for(column: u32, row: u32) -> Aabb {
        Aabb::new(
            (column * BLOCK_WIDTH) as f32,
            (row * BLOCK_HEIGHT) as f32,
            BLOCK_WIDTH as f32,
            BLOCK_HEIGHT as f32,
        )
    }
}

/// Complete game state (deterministic)
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub board_width: u32,
    pub board_height: u32,
    pub blocks: BlockGrid,
    pub ball: Ball,
    pub paddle: Paddle,
    pub score: u32,
}

impl Game {
    pub fn new(board_width: u32, board_height: u32) -> Self {
        let mut game = Self {
            board_width,
            board_height,
            blocks: BlockGrid::new(board_width / BLOCK_WIDTH, board_height / 2 / BLOCK_HEIGHT),
            ball: Ball::spawn(board_width, board_height),
            paddle: Paddle::new(board_width, board_height),
            score: 0,
        };
        game.reset();
        game
    }

    /// New ball, full block grid, zero score; the paddle stays where it is
    pub fn reset(&mut self) {
        self.ball = Ball::spawn(self.board_width, self.board_height);
        self.blocks.fill_alternating();
        self.score = 0;
        log::info!("New game! {} blocks", self.blocks.remaining());
    }

    pub fn set_paddle_position(&mut self, x: f32) {
        self.paddle.set_center_x(x);
    }

    /// The ball fell past the bottom edge
    pub fn is_over(&self) -> bool {
        self.ball.pos.y > self.board_height as f32
    }

    /// Every block is gone
    pub fn is_won(&self) -> bool {
        self.blocks.remaining() == 0
    }
}
