//! Thread-safe facade over the simulation
//!
//! `BubbleWorld` is what a host UI talks to. Every method takes `&self`, so
//! it can be shared between the UI thread, sensor callbacks and the tick
//! loop. The physics world sits behind a single mutex; the driver and the
//! sensor adapter each have their own.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::Vec2;

use crate::driver::{FrameCallback, SimulationDriver};
use crate::error::SimError;
use crate::sensor::{GravityInputAdapter, SensorSource};
use crate::sim::{Barrier, Bubble, BubbleId, Frame, PhysicsWorld};
use crate::tuning::Tuning;

pub struct BubbleWorld<H> {
    world: Arc<Mutex<PhysicsWorld<H>>>,
    sensors: Mutex<GravityInputAdapter>,
    driver: Mutex<SimulationDriver>,
    on_tick: FrameCallback,
}

impl<H: Send + 'static> BubbleWorld<H> {
    /// Build an idle world. `on_tick` receives every frame on the tick
    /// thread, after the world lock has been released.
    pub fn new<F>(tuning: Tuning, on_tick: F) -> Result<Self, SimError>
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        let sensors = GravityInputAdapter::from_tuning(&tuning);
        let driver = SimulationDriver::new(tuning.tick_interval(), tuning.time_step());
        let world = PhysicsWorld::new(tuning)?;
        Ok(Self {
            world: Arc::new(Mutex::new(world)),
            sensors: Mutex::new(sensors),
            driver: Mutex::new(driver),
            on_tick: Arc::new(on_tick),
        })
    }

    fn lock_world(&self) -> MutexGuard<'_, PhysicsWorld<H>> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_driver(&self) -> MutexGuard<'_, SimulationDriver> {
        self.driver.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the barrier (pixels). Ignored once a barrier exists, whatever
    /// the arguments.
    pub fn init_barrier(
        &self,
        width: f32,
        height: f32,
        center_x: f32,
        center_y: f32,
    ) -> Result<(), SimError> {
        self.init_barrier_with(|| Barrier::new(width, height, center_x, center_y))
    }

    /// Barrier sized for a container laid out at `width` × `height`
    pub fn init_for_container(&self, width: f32, height: f32) -> Result<(), SimError> {
        self.init_barrier_with(|| Barrier::for_container(width, height))
    }

    fn init_barrier_with(
        &self,
        build: impl FnOnce() -> Result<Barrier, SimError>,
    ) -> Result<(), SimError> {
        let mut world = self.lock_world();
        if world.barrier().is_some() {
            log::debug!("Barrier already initialized, ignoring");
            return Ok(());
        }
        world.init_barrier(build()?);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.lock_world().barrier().is_some()
    }

    pub fn barrier_width(&self) -> Option<f32> {
        self.lock_world().barrier().map(Barrier::width)
    }

    pub fn barrier_height(&self) -> Option<f32> {
        self.lock_world().barrier().map(Barrier::height)
    }

    /// Drop a bubble of `radius` px in through the open top
    pub fn create_bubble(&self, radius: f32, handle: H) -> Result<BubbleId, SimError> {
        let bubble = Bubble::new(handle, radius)?;
        self.lock_world().create_bubble(bubble)
    }

    /// Insert `bubbles` one at a time, waiting `interval` before each.
    ///
    /// Runs on its own thread; join the handle for every insertion's result
    /// in declared order.
    pub fn add_bubbles(
        &self,
        interval: Duration,
        bubbles: Vec<Bubble<H>>,
    ) -> Result<JoinHandle<Vec<Result<BubbleId, SimError>>>, SimError> {
        let world = Arc::clone(&self.world);
        let handle = thread::Builder::new()
            .name("bubble-spawner".to_string())
            .spawn(move || {
                bubbles
                    .into_iter()
                    .map(|bubble| {
                        thread::sleep(interval);
                        world
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .create_bubble(bubble)
                    })
                    .collect()
            })
            .map_err(SimError::Spawn)?;
        Ok(handle)
    }

    /// Command the barrier toward (`x`, `y`) px; it arrives on the next tick
    pub fn move_barrier(&self, x: f32, y: f32) -> Result<(), SimError> {
        self.lock_world().move_barrier(Vec2::new(x, y))
    }

    /// Raw gravity sensor reading
    pub fn update_gravity(&self, raw_x: f32, raw_y: f32) {
        self.on_sensor(SensorSource::Gravity, raw_x, raw_y);
    }

    /// Raw linear acceleration sensor reading
    pub fn update_linear_acceleration(&self, raw_x: f32, raw_y: f32) {
        self.on_sensor(SensorSource::LinearAcceleration, raw_x, raw_y);
    }

    fn on_sensor(&self, source: SensorSource, raw_x: f32, raw_y: f32) {
        // Sensors stay locked until the world has the result, so readings
        // land in the order they were combined
        let mut sensors = self.sensors.lock().unwrap_or_else(PoisonError::into_inner);
        let gravity = sensors.on_raw_vector_changed(source, raw_x, raw_y);
        self.lock_world().update_gravity(gravity.x, gravity.y);
    }

    /// Start (or restart) the tick loop
    pub fn start(&self) -> Result<(), SimError> {
        // Old loops are joined outside the driver lock, their callback may
        // call back in
        loop {
            let previous = {
                let mut driver = self.lock_driver();
                match driver.take_job() {
                    Some(job) => job,
                    None => {
                        return driver.start(Arc::clone(&self.world), Arc::clone(&self.on_tick));
                    }
                }
            };
            previous.finish();
        }
    }

    /// Stop the tick loop. Safe to call when idle or from `on_tick`.
    pub fn cancel(&self) {
        let job = self.lock_driver().take_job();
        if let Some(job) = job {
            job.finish();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_driver().is_running()
    }

    /// Snapshot of the current poses
    pub fn frame(&self) -> Frame {
        self.lock_world().frame()
    }

    /// Read access to the world under its lock
    pub fn with_world<R>(&self, f: impl FnOnce(&PhysicsWorld<H>) -> R) -> R {
        f(&self.lock_world())
    }
}
