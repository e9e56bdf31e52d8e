//! Gravity input adapter
//!
//! Combines the device's gravity vector with its linear acceleration into
//! the gravity the bubbles feel. Each source keeps its last reading, so an
//! update from either one recomputes with the other's stale value.

use glam::Vec2;

use crate::consts::{GRAVITY_CORRECTION, LINEAR_ACCELERATION_CORRECTION};
use crate::tuning::Tuning;

/// Which raw vector changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSource {
    Gravity,
    LinearAcceleration,
}

#[derive(Debug, Clone)]
pub struct GravityInputAdapter {
    gravity: Vec2,
    linear_acceleration: Vec2,
    gravity_correction: f32,
    linear_acceleration_correction: f32,
}

impl Default for GravityInputAdapter {
    fn default() -> Self {
        Self::new(GRAVITY_CORRECTION, LINEAR_ACCELERATION_CORRECTION)
    }
}

impl GravityInputAdapter {
    pub fn new(gravity_correction: f32, linear_acceleration_correction: f32) -> Self {
        Self {
            gravity: Vec2::ZERO,
            linear_acceleration: Vec2::ZERO,
            gravity_correction,
            linear_acceleration_correction,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.gravity_correction, tuning.linear_acceleration_correction)
    }

    /// Record a raw reading and return the corrected gravity
    pub fn on_raw_vector_changed(&mut self, source: SensorSource, x: f32, y: f32) -> Vec2 {
        match source {
            SensorSource::Gravity => self.gravity = Vec2::new(x, y),
            SensorSource::LinearAcceleration => self.linear_acceleration = Vec2::new(x, y),
        }
        self.corrected()
    }

    /// Corrected gravity from the last readings.
    ///
    /// The sensor X axis points the opposite way to screen X, hence the
    /// negated X component.
    pub fn corrected(&self) -> Vec2 {
        let weighted = self.gravity * self.gravity_correction
            + self.linear_acceleration * self.linear_acceleration_correction;
        Vec2::new(-weighted.x, weighted.y)
    }
}
