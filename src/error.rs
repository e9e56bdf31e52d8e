//! Error types for the simulation and its configuration.

use std::path::PathBuf;

/// Errors raised by simulation commands.
///
/// Everything here is a caller-facing validation failure; solver internals
/// never fail.
#[derive(Debug)]
pub enum SimError {
    /// A bubble was requested before the barrier exists
    UninitializedBarrier,
    /// Barrier dimensions must be finite and positive
    InvalidBarrier { width: f32, height: f32 },
    /// Bubble radius must be finite and positive
    InvalidRadius(f32),
    /// Bubble diameter exceeds the barrier width
    BubbleTooLarge { radius: f32, barrier_width: f32 },
    /// Rejected tuning
    Tuning(TuningError),
    /// Background thread could not be spawned
    Spawn(std::io::Error),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::UninitializedBarrier => {
                write!(formatter, "Barrier is not initialized")
            }
            SimError::InvalidBarrier { width, height } => {
                write!(formatter, "Invalid barrier size {}x{}", width, height)
            }
            SimError::InvalidRadius(radius) => {
                write!(formatter, "Invalid bubble radius {}", radius)
            }
            SimError::BubbleTooLarge {
                radius,
                barrier_width,
            } => write!(
                formatter,
                "Bubble radius {} does not fit in barrier of width {}",
                radius, barrier_width
            ),
            SimError::Tuning(error) => write!(formatter, "Invalid tuning: {}", error),
            SimError::Spawn(error) => {
                write!(formatter, "Failed to spawn simulation thread: {}", error)
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Tuning(error) => Some(error),
            SimError::Spawn(error) => Some(error),
            _ => None,
        }
    }
}

impl From<TuningError> for SimError {
    fn from(error: TuningError) -> Self {
        SimError::Tuning(error)
    }
}

/// Error types for tuning load/save/validation.
#[derive(Debug)]
pub enum TuningError {
    /// IO error when reading or writing tuning files
    Io { path: PathBuf, error: std::io::Error },
    /// JSON parsing error
    Parse {
        path: Option<PathBuf>,
        error: serde_json::Error,
    },
    /// JSON serialization error
    Serialize { error: serde_json::Error },
    /// A value is out of its allowed range
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for TuningError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuningError::Io { path, error } => write!(
                formatter,
                "Failed to read/write tuning file '{}': {}",
                path.display(),
                error
            ),
            TuningError::Parse {
                path: Some(path),
                error,
            } => write!(
                formatter,
                "Failed to parse tuning file '{}': {}",
                path.display(),
                error
            ),
            TuningError::Parse { path: None, error } => {
                write!(formatter, "Failed to parse tuning: {}", error)
            }
            TuningError::Serialize { error } => {
                write!(formatter, "Failed to serialize tuning: {}", error)
            }
            TuningError::Invalid { field, reason } => {
                write!(formatter, "Tuning field '{}' {}", field, reason)
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Io { error, .. } => Some(error),
            TuningError::Parse { error, .. } => Some(error),
            TuningError::Serialize { error } => Some(error),
            TuningError::Invalid { .. } => None,
        }
    }
}
