//! Fixed timestep simulation tick
//!
//! Advances the ball one step and resolves collisions deterministically.

use glam::Vec2;
use std::f32::consts::PI;

use super::collision::{ball_hits_rect, reflect};
use super::state::{BALL_SPEED, Game};

/// Something notable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    WallBounce,
    PaddleHit,
    BlockDestroyed { column: u32, row: u32 },
}

impl Game {
    /// Advance the game state by one fixed timestep
    pub fn advance(&mut self, dt: f32) -> Vec<GameEvent> {
        self.ball.pos += self.ball.vel * dt;
        self.handle_collisions()
    }

    fn handle_collisions(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let width = self.board_width as f32;
        let ball = &mut self.ball;

        if ball.pos.x < 0.0 {
            ball.vel = reflect(ball.vel, Vec2::new(1.0, 0.0));
            ball.pos.x = 0.0;
            events.push(GameEvent::WallBounce);
        } else if ball.pos.x > width {
            ball.vel = reflect(ball.vel, Vec2::new(-1.0, 0.0));
            ball.pos.x = width;
            events.push(GameEvent::WallBounce);
        }

        if ball.pos.y < 0.0 {
            ball.vel = reflect(ball.vel, Vec2::new(0.0, 1.0));
            ball.pos.y = 0.0;
            events.push(GameEvent::WallBounce);
        }

        if ball_hits_rect(self.ball.pos, self.ball.radius, &self.paddle.rect).is_some() {
            self.ball.vel = self.velocity_from_ball_pos(self.ball.pos.x);
            events.push(GameEvent::PaddleHit);
        }

        // At most one block per step
        let hit = self.blocks.iter().find_map(|(column, row, rect)| {
            ball_hits_rect(self.ball.pos, self.ball.radius, &rect).map(|n| (column, row, n))
        });
        if let Some((column, row, normal)) = hit {
            self.ball.pos += normal * self.ball.radius;
            self.ball.vel = reflect(self.ball.vel, normal);
            self.blocks.remove(column, row);
            self.score += 1;
            log::info!("Score: {}", self.score);
            events.push(GameEvent::BlockDestroyed { column, row });
        }

        events
    }

    /// Bounce direction from where the ball met the paddle: the center
    /// sends it straight up, the edges up to 45° sideways
    fn velocity_from_ball_pos(&self, ball_x: f32) -> Vec2 {
        let paddle = &self.paddle.rect;
        let relative_x = (ball_x - paddle.x) / paddle.width;
        let angle = (relative_x - 0.5) * (PI * 0.5);
        Vec2::new(angle.sin() * BALL_SPEED, -angle.cos() * BALL_SPEED)
    }
}
