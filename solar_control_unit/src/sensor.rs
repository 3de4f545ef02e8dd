//! Sensor acquisition root.
//!
//! Retrying reads through the HAL and the per-sensor health state machine
//! that decides how long a last-known-good value may stand in for a fault.

pub mod health;
pub mod reader;

pub use health::{SensorHealthMonitor, SensorHealthRecord};
pub use reader::{ReadResult, RetryPolicy, SensorReader};
