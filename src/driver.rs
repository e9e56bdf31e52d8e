//! Fixed-rate simulation driver
//!
//! Runs the tick loop on a background thread:
//! - waits out the tick interval (cancellable)
//! - steps the world under its lock
//! - releases the lock, then hands the new frame to the callback
//!
//! The wait is a `recv_timeout` on a stop channel, so `cancel` wakes the
//! thread immediately instead of waiting for the next tick.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::error::SimError;
use crate::sim::{Frame, PhysicsWorld};

/// Per-frame callback, invoked once per completed tick on the driver thread
pub type FrameCallback = Arc<dyn Fn(&Frame) + Send + Sync>;

/// A running tick loop
pub(crate) struct Job {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Idle/Running tick loop owner
pub struct SimulationDriver {
    interval: Duration,
    time_step: f32,
    job: Option<Job>,
}

impl SimulationDriver {
    /// `interval` is the wall-clock wait between ticks, `time_step` the
    /// simulated seconds per tick
    pub fn new(interval: Duration, time_step: f32) -> Self {
        Self {
            interval,
            time_step,
            job: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a loop is currently running
    pub fn is_running(&self) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| !job.handle.is_finished())
    }

    /// Start ticking `world`, cancelling any loop already running
    pub fn start<H: Send + 'static>(
        &mut self,
        world: Arc<Mutex<PhysicsWorld<H>>>,
        on_tick: FrameCallback,
    ) -> Result<(), SimError> {
        self.cancel();

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let interval = self.interval;
        let time_step = self.time_step;
        let handle = thread::Builder::new()
            .name("bubble-sim".to_string())
            .spawn(move || run_loop(world, on_tick, stop_rx, interval, time_step))
            .map_err(SimError::Spawn)?;

        log::info!("Simulation started ({:?} per tick)", interval);
        self.job = Some(Job { stop_tx, handle });
        Ok(())
    }

    /// Stop the loop. The tick in flight (if any) completes; no further
    /// tick begins. Safe to call when idle.
    pub fn cancel(&mut self) {
        if let Some(job) = self.take_job() {
            job.finish();
        }
    }

    /// Detach the running loop so it can be stopped without holding `self`
    pub(crate) fn take_job(&mut self) -> Option<Job> {
        self.job.take()
    }
}

impl Job {
    /// Signal the loop to stop and wait for it, unless called from the
    /// loop's own thread (the loop then exits after the current callback)
    pub(crate) fn finish(self) {
        let Job { stop_tx, handle } = self;
        let _ = stop_tx.try_send(());
        drop(stop_tx);

        if handle.thread().id() == thread::current().id() {
            log::info!("Simulation cancelled from its own callback");
            return;
        }
        if handle.join().is_err() {
            log::warn!("Simulation thread panicked");
        }
        log::info!("Simulation stopped");
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_loop<H>(
    world: Arc<Mutex<PhysicsWorld<H>>>,
    on_tick: FrameCallback,
    stop_rx: Receiver<()>,
    interval: Duration,
    time_step: f32,
) {
    let mut tick_start = Instant::now();
    let mut overrunning = false;

    loop {
        // No catch-up: an overrun tick is followed by an immediate one
        let wait = interval.saturating_sub(tick_start.elapsed());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        tick_start = Instant::now();

        let frame = {
            let mut world = world.lock().unwrap_or_else(PoisonError::into_inner);
            world.step(time_step);
            world.frame()
        };
        on_tick(&frame);

        let elapsed = tick_start.elapsed();
        if elapsed > interval {
            if !overrunning {
                log::warn!(
                    "Tick {} took {:?} (budget {:?})",
                    frame.tick,
                    elapsed,
                    interval
                );
            }
            overrunning = true;
        } else {
            overrunning = false;
        }
    }
}
