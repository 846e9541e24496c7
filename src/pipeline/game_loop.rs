//! Game loop stage: fixed-step simulation, composition and key handling

use std::sync::Arc;

use image::RgbImage;

use super::ControlSignal;
use super::worker::RunFlag;
use crate::consts::*;
use crate::error::Result;
use crate::platform::{Clock, Display};
use crate::queue::BoundedQueue;
use crate::renderer::render_onto;
use crate::sim::{Game, GameEvent};

/// Whether the loop should keep going after a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

pub struct GameLoopStage<D, K> {
    positions: Arc<BoundedQueue<ControlSignal>>,
    images: Arc<BoundedQueue<Arc<RgbImage>>>,
    game: Game,
    display: D,
    clock: K,
    /// Simulation time owed; starts negative to hold the game for a countdown
    accumulator: f32,
    background: Arc<RgbImage>,
    canvas: RgbImage,
    /// Events from the most recent `step`
    events: Vec<GameEvent>,
}

impl<D: Display, K: Clock> GameLoopStage<D, K> {
    pub fn new(
        positions: Arc<BoundedQueue<ControlSignal>>,
        images: Arc<BoundedQueue<Arc<RgbImage>>>,
        board_size: (u32, u32),
        display: D,
        clock: K,
    ) -> Self {
        let (width, height) = board_size;
        Self {
            positions,
            images,
            game: Game::new(width, height),
            display,
            clock,
            accumulator: -START_COUNTDOWN,
            background: Arc::new(RgbImage::new(width, height)),
            canvas: RgbImage::new(width, height),
            events: Vec::new(),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn into_display(self) -> D {
        self.display
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// What happened during the substeps of the last cycle
    pub fn last_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Start timing from now
    pub fn start(&mut self) -> Result<()> {
        self.clock.reset()
    }

    /// One pass: steer, simulate, compose, show, poll keys
    pub fn cycle(&mut self) -> Result<LoopControl> {
        if let Some(position) = self.positions.try_pop() {
            self.game.set_paddle_position(position.x);
        }

        let elapsed = self.clock.elapsed_seconds()?;
        self.clock.reset()?;
        self.step(elapsed);

        if let Some(image) = self.images.try_pop() {
            self.background = image;
        }
        self.compose();
        self.display.show(&self.canvas);

        match self.display.poll_key(KEY_POLL) {
            Some(KEY_ESC) => Ok(LoopControl::Quit),
            _ => Ok(LoopControl::Continue),
        }
    }

    /// Feed `elapsed` seconds into the accumulator and run the fixed steps
    /// it pays for. Returns the number of steps run.
    fn step(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed.min(MAX_FRAME_DT);

        self.events.clear();
        let mut substeps = 0;
        while self.accumulator > SIM_DT && substeps < MAX_SUBSTEPS {
            for event in self.game.advance(SIM_DT) {
                if event != GameEvent::WallBounce {
                    log::debug!("{event:?}");
                }
                self.events.push(event);
            }
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        if self.game.is_over() {
            log::info!("You lose! Score: {}", self.game.score);
            self.game.reset();
        } else if self.game.is_won() {
            log::info!("You win! Score: {}", self.game.score);
            self.game.reset();
        }

        substeps
    }

    /// Game on top of the latest diagnostic image
    fn compose(&mut self) {
        if self.canvas.dimensions() == self.background.dimensions() {
            self.canvas.copy_from_slice(&self.background);
        } else {
            self.canvas = (*self.background).clone();
        }
        render_onto(&self.game, &mut self.canvas);
    }

    /// Cycle until stopped, quit by key, or the clock fails. The flag is
    /// cleared on the way out in every case.
    pub fn run(&mut self, flag: &RunFlag) -> Result<()> {
        let result = self.run_until_stopped(flag);
        if let Err(e) = &result {
            log::error!("{e}");
        }
        flag.stop();
        result
    }

    fn run_until_stopped(&mut self, flag: &RunFlag) -> Result<()> {
        self.start()?;
        while flag.is_running() {
            if self.cycle()? == LoopControl::Quit {
                log::info!("Quit requested");
                break;
            }
        }
        Ok(())
    }
}
