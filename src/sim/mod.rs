//! Deterministic simulation module
//!
//! The block/paddle/ball game the tracked marker steers. Pure and
//! deterministic:
//! - Fixed timestep only
//! - Stable iteration order (row-major over blocks)
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{Aabb, ball_hits_rect, reflect};
pub use state::{Ball, BlockGrid, Game, Paddle};
pub use tick::GameEvent;
