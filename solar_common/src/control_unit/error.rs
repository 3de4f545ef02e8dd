//! Error types for the control engine and the heater guard.
//!
//! These are rejections and skipped decisions, not crashes: nothing here
//! terminates the control loop.

use thiserror::Error;

/// Result type for control engine operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Which temperature input was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureInput {
    Collector,
    Tank,
}

impl core::fmt::Display for TemperatureInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Collector => write!(f, "collector"),
            Self::Tank => write!(f, "tank"),
        }
    }
}

/// Control engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    /// A required temperature is absent this cycle; previous state is held.
    #[error("{0} temperature unusable, holding previous state")]
    UnusableInput(TemperatureInput),
}

/// Rejected heater switch requests. State is unchanged on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum HeaterError {
    /// Tank is at or above the heater ceiling.
    #[error("tank temperature {tank_temp:.1} °C at or above heater limit {temp_limit:.1} °C")]
    TempLimitExceeded { tank_temp: f64, temp_limit: f64 },

    /// Anti-cycling lockout still running.
    #[error("heater lockout active, {0:.1} s remaining")]
    Lockout(f64),
}
