//! Prelude module for common re-exports.
//!
//! ```rust
//! use solar_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::control_unit::config::{ControlThresholds, SolarConfig, ThresholdField};

// ─── State ──────────────────────────────────────────────────────────
pub use crate::control_unit::state::{ControlSnapshot, ControlState, HeaterState, Mode};

// ─── Sensors ────────────────────────────────────────────────────────
pub use crate::control_unit::sensor::{HealthSummary, SensorSample, SensorStatus};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::control_unit::error::{ControlError, ControlResult, HeaterError};

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::driver::{HalDriver, HalError};
pub use crate::hal::types::{Actuation, OutputRole, RelayLevel, RelayWiring, SensorId};
