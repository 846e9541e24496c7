//! Time sources for the game loop

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// Elapsed-time source, read once per game loop cycle
pub trait Clock {
    /// Start measuring from now
    fn reset(&mut self) -> Result<()>;

    /// Seconds since the last reset
    fn elapsed_seconds(&mut self) -> Result<f32>;
}

/// Wall clock. Fails if system time steps backwards past the last reset.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: SystemTime,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: SystemTime::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn reset(&mut self) -> Result<()> {
        self.start = SystemTime::now();
        Ok(())
    }

    fn elapsed_seconds(&mut self) -> Result<f32> {
        Ok(SystemTime::now().duration_since(self.start)?.as_secs_f32())
    }
}

/// Deterministic clock: every read advances time by a fixed step.
///
/// Can be told to jump backwards once, which makes the next read fail the
/// same way a broken wall clock does.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: SystemTime,
    now: SystemTime,
    step: Duration,
    reads: u32,
    jump_back: Option<(u32, Duration)>,
}

impl ManualClock {
    pub fn new(step: Duration) -> Self {
        let origin = UNIX_EPOCH + Duration::from_secs(86_400);
        Self {
            start: origin,
            now: origin,
            step,
            reads: 0,
            jump_back: None,
        }
    }

    /// On read number `read` (1-based), step back by `by` instead of forward
    pub fn jump_back_at(mut self, read: u32, by: Duration) -> Self {
        self.jump_back = Some((read, by));
        self
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl Clock for ManualClock {
    fn reset(&mut self) -> Result<()> {
        self.start = self.now;
        Ok(())
    }

    fn elapsed_seconds(&mut self) -> Result<f32> {
        self.reads += 1;
        self.now = match self.jump_back {
            Some((read, by)) if read == self.reads => {
                self.now.checked_sub(by).unwrap_or(UNIX_EPOCH)
            }
            _ => self.now + self.step,
        };
        Ok(self.now.duration_since(self.start)?.as_secs_f32())
    }
}
