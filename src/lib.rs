//! Bubble World - bouncy bubbles in a movable, open-topped container
//!
//! Core modules:
//! - `sim`: Rigid-body simulation (bodies, contacts, solver, per-tick bookkeeping)
//! - `driver`: Fixed-rate background loop that ticks the simulation
//! - `sensor`: Raw gravity/acceleration vectors to corrected gravity
//! - `tuning`: Data-driven physics constants
//! - `bubble_world`: Thread-safe facade tying the pieces together

pub mod bubble_world;
pub mod driver;
pub mod error;
pub mod sensor;
pub mod sim;
pub mod tuning;

#[cfg(test)]
pub(crate) mod test_log;

pub use bubble_world::BubbleWorld;
pub use driver::{FrameCallback, SimulationDriver};
pub use error::{SimError, TuningError};
pub use sensor::{GravityInputAdapter, SensorSource};
pub use tuning::Tuning;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation configuration constants
pub mod consts {
    /// Defines how many pixels correspond to 1 meter
    pub const PIXELS_PER_METER: f32 = 2000.0;

    /// Fixed simulation rate (120 Hz for smooth physics)
    pub const TARGET_TPS: f32 = 120.0;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TARGET_TPS;
    /// Maximum substeps per tick (fast bubbles are split so they can't tunnel)
    pub const MAX_SUBSTEPS: u32 = 32;

    /// Fixture defaults
    pub const FRICTION: f32 = 0.4;
    pub const RESTITUTION: f32 = 0.6;
    /// kg/m²
    pub const DENSITY: f32 = 1.0;
    /// Limits the maximum speed of a bubble
    pub const LINEAR_DAMPING: f32 = 1.0;
    /// Initial kick given to every new bubble (N·s)
    pub const INITIAL_IMPULSE: f32 = 0.005;

    /// Earth gravity pointing down-screen (m/s²)
    pub const DEFAULT_GRAVITY: (f32, f32) = (0.0, 9.8);

    /// Sensor correction factors
    pub const GRAVITY_CORRECTION: f32 = 0.6;
    pub const LINEAR_ACCELERATION_CORRECTION: f32 = 2.4;

    /// Bubble position before its first placement (far off-screen)
    pub const UNPLACED_POSITION: f32 = -10_000_000.0;
}

/// Convert a pixel quantity to meters using the default scale
#[inline]
pub fn pixels_to_meters(px: f32) -> f32 {
    px / consts::PIXELS_PER_METER
}

/// Convert a meter quantity to pixels using the default scale
#[inline]
pub fn meters_to_pixels(m: f32) -> f32 {
    m * consts::PIXELS_PER_METER
}

/// Pixel/meter conversion with a configurable ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub pixels_per_meter: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            pixels_per_meter: consts::PIXELS_PER_METER,
        }
    }
}

impl Scale {
    pub fn new(pixels_per_meter: f32) -> Self {
        Self { pixels_per_meter }
    }

    #[inline]
    pub fn to_meters(&self, px: f32) -> f32 {
        px / self.pixels_per_meter
    }

    #[inline]
    pub fn to_pixels(&self, m: f32) -> f32 {
        m * self.pixels_per_meter
    }

    #[inline]
    pub fn vec_to_meters(&self, px: Vec2) -> Vec2 {
        px / self.pixels_per_meter
    }

    #[inline]
    pub fn vec_to_pixels(&self, m: Vec2) -> Vec2 {
        m * self.pixels_per_meter
    }
}
