//! Named background thread with a cooperative stop flag

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};

/// Shared "keep going" flag. Stages check it once per cycle.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// A flag that starts out running
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipeline stage running on its own thread.
///
/// Dropping a worker stops and joins it.
pub struct Worker {
    name: &'static str,
    flag: RunFlag,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn `body` on a new thread. The flag is cleared when `body` returns.
    pub fn spawn<F>(name: &'static str, body: F) -> Result<Self>
    where
        F: FnOnce(&RunFlag) + Send + 'static,
    {
        let flag = RunFlag::new();
        let thread_flag = flag.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                body(&thread_flag);
                thread_flag.stop();
            })?;
        log::info!("{name} worker started");

        Ok(Self {
            name,
            flag,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.flag.is_running()
    }

    /// Ask the worker to finish its current cycle and exit
    pub fn stop(&self) {
        self.flag.stop();
    }

    /// Stop the worker and wait for its thread
    pub fn join(mut self) -> Result<()> {
        self.stop();
        self.wait()
    }

    fn wait(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| Error::WorkerPanicked(self.name))?;
        log::info!("{} worker stopped", self.name);
        Ok(())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
        if let Err(e) = self.wait() {
            log::error!("{e}");
        }
    }
}
