//! Workspace-wide constants for the solar loop controller.
//!
//! Single source of truth for defaults and bounds. Imported by all crates.

/// Default control cycle period [ms].
pub const CYCLE_INTERVAL_MS_DEFAULT: u64 = 5_000;

/// Shortest accepted control cycle period [ms].
pub const CYCLE_INTERVAL_MS_MIN: u64 = 100;

/// Longest accepted control cycle period [ms].
pub const CYCLE_INTERVAL_MS_MAX: u64 = 600_000;

/// Default number of read attempts per sensor per cycle.
pub const SENSOR_MAX_RETRIES_DEFAULT: u32 = 3;

/// Default delay before the first retry [ms].
pub const SENSOR_INITIAL_BACKOFF_MS_DEFAULT: u64 = 100;

/// Upper bound for a single backoff sleep [ms].
pub const SENSOR_MAX_BACKOFF_MS_DEFAULT: u64 = 1_000;

/// Hard cap on read attempts, bounds worst-case cycle latency.
pub const SENSOR_MAX_RETRIES_LIMIT: u32 = 10;

/// Default window during which a last-known-good value may stand in [s].
pub const STALE_THRESHOLD_S_DEFAULT: f64 = 15.0;

/// Consecutive failures before a sensor is reported for alerting.
pub const ALERT_THRESHOLD_DEFAULT: u32 = 5;

/// Lowest physically plausible calibrated temperature [°C].
pub const PLAUSIBLE_MIN_C: f64 = -50.0;

/// Highest physically plausible calibrated temperature [°C].
pub const PLAUSIBLE_MAX_C: f64 = 200.0;

/// Raw value the RTD acquisition board reports for an open/faulty channel.
pub const RAW_FAULT_SENTINEL: f64 = 60.0;

/// Factor applied to the raw reading (kΩ) before calibration lookup (Ω).
pub const RAW_SCALE: f64 = 1000.0;

/// Default heater anti-cycling lockout [s].
pub const HEATER_LOCKOUT_S_DEFAULT: f64 = 5.0;

/// Default tank ceiling above which the heater may not switch on [°C].
pub const HEATER_TEMP_LIMIT_DEFAULT: f64 = 80.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/solar.toml";
