//! Physics tuning
//!
//! Every constant the simulation reads lives here so a host can adjust the
//! feel without recompiling. Loaded from JSON; missing fields keep their
//! defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Scale;
use crate::consts::*;
use crate::error::TuningError;

/// Physics tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Pixels per simulation meter
    pub pixels_per_meter: f32,
    /// Simulation ticks per second
    pub tick_rate: f32,

    // === Fixtures ===
    /// Friction coefficient, usually in [0, 1]
    pub friction: f32,
    /// Restitution (elasticity), in [0, 1]
    pub restitution: f32,
    /// Density in kg/m²
    pub density: f32,
    /// Bubble linear damping (bounds terminal velocity)
    pub linear_damping: f32,
    /// Magnitude of the kick given to a new bubble (N·s)
    pub initial_impulse: f32,

    // === Gravity ===
    /// Gravity before any sensor input (m/s², +y is down-screen)
    pub gravity: Vec2,
    /// Weight of the raw gravity sensor
    pub gravity_correction: f32,
    /// Weight of the raw linear acceleration sensor
    pub linear_acceleration_correction: f32,

    // === Solver ===
    pub velocity_iterations: u32,
    pub position_iterations: u32,

    /// RNG seed (random per world when absent)
    pub seed: Option<u64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            pixels_per_meter: PIXELS_PER_METER,
            tick_rate: TARGET_TPS,

            friction: FRICTION,
            restitution: RESTITUTION,
            density: DENSITY,
            linear_damping: LINEAR_DAMPING,
            initial_impulse: INITIAL_IMPULSE,

            gravity: Vec2::new(DEFAULT_GRAVITY.0, DEFAULT_GRAVITY.1),
            gravity_correction: GRAVITY_CORRECTION,
            linear_acceleration_correction: LINEAR_ACCELERATION_CORRECTION,

            velocity_iterations: 8,
            position_iterations: 3,

            seed: None,
        }
    }
}

impl Tuning {
    /// Default tuning with a fixed RNG seed (reproducible runs)
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Pixel/meter conversion for this tuning
    pub fn scale(&self) -> Scale {
        Scale::new(self.pixels_per_meter)
    }

    /// Seconds advanced per tick
    pub fn time_step(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Wall-clock wait between ticks, truncated to whole milliseconds
    /// (8 ms at 120 Hz)
    pub fn tick_interval(&self) -> Duration {
        let millis = (self.time_step() * 1000.0) as u64;
        Duration::from_millis(millis.max(1))
    }

    /// Check every value is usable by the solver
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("pixels_per_meter", self.pixels_per_meter)?;
        positive("tick_rate", self.tick_rate)?;
        positive("density", self.density)?;
        non_negative("friction", self.friction)?;
        non_negative("restitution", self.restitution)?;
        non_negative("linear_damping", self.linear_damping)?;
        non_negative("initial_impulse", self.initial_impulse)?;
        finite("gravity_correction", self.gravity_correction)?;
        finite(
            "linear_acceleration_correction",
            self.linear_acceleration_correction,
        )?;

        if self.restitution > 1.0 {
            return Err(invalid("restitution", "must not exceed 1"));
        }
        if !self.gravity.is_finite() {
            return Err(invalid("gravity", "must be finite"));
        }
        if self.velocity_iterations == 0 {
            return Err(invalid("velocity_iterations", "must be at least 1"));
        }
        if self.position_iterations == 0 {
            return Err(invalid("position_iterations", "must be at least 1"));
        }
        Ok(())
    }

    /// Parse tuning from a JSON string and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self =
            serde_json::from_str(json).map_err(|error| TuningError::Parse { path: None, error })?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        serde_json::to_string_pretty(self).map_err(|error| TuningError::Serialize { error })
    }

    /// Load and validate tuning from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| TuningError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let tuning: Self =
            serde_json::from_str(&contents).map_err(|error| TuningError::Parse {
                path: Some(path.to_path_buf()),
                error,
            })?;
        tuning.validate()?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Save tuning to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TuningError> {
        let contents = self.to_json()?;
        fs::write(path.as_ref(), contents).map_err(|error| TuningError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

fn invalid(field: &'static str, reason: &str) -> TuningError {
    TuningError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and positive"))
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be finite"))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and non-negative"))
    }
}
