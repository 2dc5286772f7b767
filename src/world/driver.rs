use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, trace};

use super::simulation::Simulation;

/// Steps a simulation on a background thread at its configured tick interval.
///
/// A tick that overruns the interval delays the next one; missed ticks are not
/// caught up. Dropping the driver stops the thread.
#[derive(Debug)]
pub struct Driver {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl Driver {
    pub fn spawn<S: Simulation + 'static>(simulation: Arc<S>) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let thread = {
            let running = Arc::clone(&running);
            let ticks = Arc::clone(&ticks);
            thread::Builder::new()
                .name("physics-driver".into())
                .spawn(move || {
                    debug!("physics driver started");
                    while running.load(Ordering::Acquire) {
                        let start = Instant::now();
                        simulation.step();
                        ticks.fetch_add(1, Ordering::Relaxed);
                        let elapsed = start.elapsed();
                        match simulation.tick_interval().checked_sub(elapsed) {
                            Some(remaining) => thread::sleep(remaining),
                            None => trace!(?elapsed, "tick overran its interval"),
                        }
                    }
                    debug!("physics driver stopped");
                })?
        };
        Ok(Self {
            running,
            ticks,
            thread: Some(thread),
        })
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the thread after its current tick and waits for it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop();
    }
}
