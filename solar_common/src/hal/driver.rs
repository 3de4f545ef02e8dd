//! HAL driver trait and error types.
//!
//! This module defines:
//! - `HalDriver` trait - the hardware-access capability the control unit uses
//! - `HalError` enum - transient or permanent sensor/actuator I/O failures
//! - `DriverFactory` type alias - factory function type
//! - `DriverDiagnostics` struct - optional driver counters

use crate::control_unit::config::SolarConfig;
use crate::hal::types::{OutputRole, RelayLevel, SensorId};
use std::time::Duration;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sensor read failed (bus error, checksum, busy board)
    #[error("Read of sensor {sensor} failed: {reason}")]
    ReadFailed { sensor: SensorId, reason: String },

    /// Sensor channel does not exist on this driver
    #[error("Sensor {0} not available")]
    UnknownSensor(SensorId),

    /// Relay write failed
    #[error("Write to {role} output failed: {reason}")]
    WriteFailed { role: OutputRole, reason: String },

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn HalDriver>;

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverDiagnostics {
    /// Sensor reads served
    pub reads: u64,
    /// Sensor reads that returned an error
    pub read_errors: u64,
    /// Relay writes performed
    pub writes: u64,
}

/// Hardware-access capability used by the control unit.
///
/// The control unit reads raw sensor values and writes electrical relay levels
/// through this trait only. Drivers never see logical pump/heater states:
/// wiring translation happens before `write_output` is called.
///
/// # Lifecycle
///
/// 1. `init()` - once before the first cycle
/// 2. `read_sensor()` / `write_output()` / `tick()` - every cycle
/// 3. `shutdown()` - when the control unit stops
///
/// `read_sensor` takes `&self` so one cycle can fan reads out across threads.
pub trait HalDriver: Send + Sync {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Initialize the driver from the installation configuration.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if initialization cannot complete.
    fn init(&mut self, config: &SolarConfig) -> Result<(), HalError>;

    /// Read one raw (uncalibrated) value from a sensor channel.
    fn read_sensor(&self, sensor: SensorId) -> Result<f64, HalError>;

    /// Drive one relay to an electrical level.
    fn write_output(&mut self, role: OutputRole, pin: u8, level: RelayLevel)
    -> Result<(), HalError>;

    /// Advance driver-internal time. Hardware drivers ignore it.
    fn tick(&mut self, _dt: Duration) {}

    /// Graceful shutdown of the driver.
    fn shutdown(&mut self) -> Result<(), HalError>;

    /// Get driver-specific diagnostics.
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}
