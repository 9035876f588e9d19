// Error Types - Boundary validation failures
// Solvers never fail; only configuration and control snapshots are rejected here

use thiserror::Error;

/// Errors raised while building or loading a lab configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("body `{body}`: eccentricity {value} must lie in [0, 1)")]
    InvalidEccentricity { body: String, value: f64 },
    #[error("body `{body}`: semi-major axis {value} must be >= 0")]
    NegativeSemiMajorAxis { body: String, value: f64 },
    #[error("`{field}` must be finite")]
    NonFinite { field: &'static str },
    #[error("`{field}` = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Errors raised when a per-tick control snapshot is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("loop count {0} must not be negative")]
    NegativeLoopCount(i32),
    #[error("loop area {0} must not be negative")]
    NegativeLoopArea(f64),
    #[error("speed multiplier {0} must be finite and >= 0")]
    InvalidSpeed(f64),
    #[error("wall-clock delta {0} must be finite and >= 0")]
    InvalidWallDelta(f64),
    #[error("`{0}` must be finite")]
    NonFinite(&'static str),
}

#[derive(Debug, Error)]
pub enum LabError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Reject NaN and infinities for a named configuration field.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

/// Require a finite, strictly positive configuration value.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "> 0",
        })
    }
}
