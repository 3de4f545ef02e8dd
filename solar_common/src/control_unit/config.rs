//! Configuration structures for the control unit.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every section
//! and field has a default, so an empty file yields the reference
//! installation. Semantic checks live in `validate()` methods.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    ALERT_THRESHOLD_DEFAULT, CYCLE_INTERVAL_MS_DEFAULT, CYCLE_INTERVAL_MS_MAX,
    CYCLE_INTERVAL_MS_MIN, HEATER_LOCKOUT_S_DEFAULT, HEATER_TEMP_LIMIT_DEFAULT, PLAUSIBLE_MAX_C,
    PLAUSIBLE_MIN_C, RAW_FAULT_SENTINEL, SENSOR_INITIAL_BACKOFF_MS_DEFAULT,
    SENSOR_MAX_BACKOFF_MS_DEFAULT, SENSOR_MAX_RETRIES_DEFAULT, SENSOR_MAX_RETRIES_LIMIT,
    STALE_THRESHOLD_S_DEFAULT,
};
use crate::hal::types::{OutputBinding, OutputRole, RelayWiring, SensorId};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete installation configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolarConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub thresholds: ControlThresholds,
    #[serde(default)]
    pub heater: HeaterConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

impl SolarConfig {
    /// Validate every section. The calibration table is checked separately by
    /// the control unit when it builds the lookup table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.cycle.validate()?;
        self.sensors.validate()?;
        self.thresholds.validate()?;
        self.heater.validate()?;
        self.outputs.validate()?;
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

// ─── Cycle ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Control cycle period [ms].
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Publish a status document every N cycles.
    #[serde(default = "default_status_every")]
    pub status_every: u32,
}

fn default_interval_ms() -> u64 {
    CYCLE_INTERVAL_MS_DEFAULT
}
fn default_status_every() -> u32 {
    1
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            status_every: default_status_every(),
        }
    }
}

impl CycleConfig {
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(CYCLE_INTERVAL_MS_MIN..=CYCLE_INTERVAL_MS_MAX).contains(&self.interval_ms) {
            return Err(invalid(format!(
                "cycle.interval_ms {} out of range [{}, {}]",
                self.interval_ms, CYCLE_INTERVAL_MS_MIN, CYCLE_INTERVAL_MS_MAX
            )));
        }
        if self.status_every == 0 {
            return Err(invalid("cycle.status_every must be at least 1".to_string()));
        }
        Ok(())
    }
}

// ─── Sensors ────────────────────────────────────────────────────────

/// Additional monitored sensor (return line, ambient, ...). Tracked for
/// health and status only; the control rules never read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliarySensor {
    pub name: String,
    pub board: u8,
    pub channel: u8,
}

impl AuxiliarySensor {
    #[inline]
    pub const fn id(&self) -> SensorId {
        SensorId::new(self.board, self.channel)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorsConfig {
    #[serde(default = "default_collector")]
    pub collector: SensorId,
    #[serde(default = "default_tank")]
    pub tank: SensorId,
    #[serde(default)]
    pub auxiliary: Vec<AuxiliarySensor>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub plausible: PlausibleRange,
}

fn default_collector() -> SensorId {
    SensorId::new(0, 1)
}
fn default_tank() -> SensorId {
    SensorId::new(0, 2)
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            collector: default_collector(),
            tank: default_tank(),
            auxiliary: Vec::new(),
            retry: RetryConfig::default(),
            health: HealthConfig::default(),
            plausible: PlausibleRange::default(),
        }
    }
}

impl SensorsConfig {
    /// Every sensor read each cycle: collector, tank, then auxiliaries.
    pub fn all_ids(&self) -> Vec<SensorId> {
        let mut ids = vec![self.collector, self.tank];
        ids.extend(self.auxiliary.iter().map(AuxiliarySensor::id));
        ids
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: HashMap<SensorId, &str> = HashMap::new();
        seen.insert(self.collector, "collector");
        if seen.insert(self.tank, "tank").is_some() {
            return Err(invalid(format!(
                "sensors.tank {} duplicates sensors.collector",
                self.tank
            )));
        }
        for aux in &self.auxiliary {
            if aux.name.is_empty() {
                return Err(invalid("auxiliary sensor name cannot be empty".to_string()));
            }
            if let Some(other) = seen.insert(aux.id(), aux.name.as_str()) {
                return Err(invalid(format!(
                    "auxiliary sensor '{}' reuses channel {} of '{}'",
                    aux.name,
                    aux.id(),
                    other
                )));
            }
        }
        self.retry.validate()?;
        self.health.validate()?;
        self.plausible.validate()
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total read attempts per sensor per cycle.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    SENSOR_MAX_RETRIES_DEFAULT
}
fn default_initial_backoff_ms() -> u64 {
    SENSOR_INITIAL_BACKOFF_MS_DEFAULT
}
fn default_max_backoff_ms() -> u64 {
    SENSOR_MAX_BACKOFF_MS_DEFAULT
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 || self.max_retries > SENSOR_MAX_RETRIES_LIMIT {
            return Err(invalid(format!(
                "sensors.retry.max_retries {} out of range [1, {}]",
                self.max_retries, SENSOR_MAX_RETRIES_LIMIT
            )));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(invalid(format!(
                "sensors.retry.initial_backoff_ms {} exceeds max_backoff_ms {}",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// How long a last-known-good value may stand in for failed reads [s].
    #[serde(default = "default_stale_threshold_s")]
    pub stale_threshold_s: f64,
    /// Consecutive failures before a sensor is flagged for alerting.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u32,
}

fn default_stale_threshold_s() -> f64 {
    STALE_THRESHOLD_S_DEFAULT
}
fn default_alert_threshold() -> u32 {
    ALERT_THRESHOLD_DEFAULT
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stale_threshold_s: default_stale_threshold_s(),
            alert_threshold: default_alert_threshold(),
        }
    }
}

impl HealthConfig {
    #[inline]
    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.stale_threshold_s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.stale_threshold_s.is_finite() || self.stale_threshold_s < 0.0 {
            return Err(invalid(format!(
                "sensors.health.stale_threshold_s {} must be a non-negative number",
                self.stale_threshold_s
            )));
        }
        if self.alert_threshold == 0 {
            return Err(invalid(
                "sensors.health.alert_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Calibrated values outside this range are treated as read failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleRange {
    #[serde(default = "default_plausible_min")]
    pub min: f64,
    #[serde(default = "default_plausible_max")]
    pub max: f64,
}

fn default_plausible_min() -> f64 {
    PLAUSIBLE_MIN_C
}
fn default_plausible_max() -> f64 {
    PLAUSIBLE_MAX_C
}

impl Default for PlausibleRange {
    fn default() -> Self {
        Self {
            min: default_plausible_min(),
            max: default_plausible_max(),
        }
    }
}

impl PlausibleRange {
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min < self.max) {
            return Err(invalid(format!(
                "sensors.plausible min {} must be below max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

// ─── Calibration ────────────────────────────────────────────────────

/// One piece of a piecewise-linear resistance → temperature table.
///
/// Covers `[resistance_lower_bound, next_lower_bound)`; the value maps to
/// `(scaled - resistance_lower_bound) / slope_divisor + base_temperature`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSegment {
    pub resistance_lower_bound: f64,
    pub slope_divisor: f64,
    pub base_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Raw value reported by the acquisition board for a faulty channel.
    #[serde(default = "default_fault_sentinel")]
    pub fault_sentinel: f64,
    /// Custom table; `None` selects the built-in PT1000 table.
    #[serde(default)]
    pub segments: Option<Vec<CalibrationSegment>>,
    /// Exclusive upper end of the last segment [Ω]. Required with `segments`.
    #[serde(default)]
    pub upper_bound: Option<f64>,
}

fn default_fault_sentinel() -> f64 {
    RAW_FAULT_SENTINEL
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            fault_sentinel: default_fault_sentinel(),
            segments: None,
            upper_bound: None,
        }
    }
}

// ─── Thresholds ─────────────────────────────────────────────────────

/// Control thresholds, read-only during a cycle.
///
/// Invariants: `start_dt > stop_dt`, `boiling_temp > cooling_temp`, every
/// hysteresis `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlThresholds {
    /// Tank temperature at which charging stops [°C].
    #[serde(default = "default_tank_target")]
    pub tank_target: f64,
    /// Charging resumes once the tank drops below `tank_target - tank_hysteresis`.
    #[serde(default)]
    pub tank_hysteresis: f64,
    /// ΔT at or above which the pump starts [K].
    #[serde(default = "default_start_dt")]
    pub start_dt: f64,
    /// ΔT at or below which the pump stops [K].
    #[serde(default = "default_stop_dt")]
    pub stop_dt: f64,
    /// Collector temperature that forces circulation [°C].
    #[serde(default = "default_cooling_temp")]
    pub cooling_temp: f64,
    #[serde(default = "default_cooling_hysteresis")]
    pub cooling_hysteresis: f64,
    /// Collector temperature that stops circulation [°C].
    #[serde(default = "default_boiling_temp")]
    pub boiling_temp: f64,
    #[serde(default = "default_boiling_hysteresis")]
    pub boiling_hysteresis: f64,
}

fn default_tank_target() -> f64 {
    70.0
}
fn default_start_dt() -> f64 {
    8.0
}
fn default_stop_dt() -> f64 {
    4.0
}
fn default_cooling_temp() -> f64 {
    90.0
}
fn default_cooling_hysteresis() -> f64 {
    4.0
}
fn default_boiling_temp() -> f64 {
    150.0
}
fn default_boiling_hysteresis() -> f64 {
    10.0
}

impl Default for ControlThresholds {
    fn default() -> Self {
        Self {
            tank_target: default_tank_target(),
            tank_hysteresis: 0.0,
            start_dt: default_start_dt(),
            stop_dt: default_stop_dt(),
            cooling_temp: default_cooling_temp(),
            cooling_hysteresis: default_cooling_hysteresis(),
            boiling_temp: default_boiling_temp(),
            boiling_hysteresis: default_boiling_hysteresis(),
        }
    }
}

/// Individually updatable threshold, addressed by its config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdField {
    TankTarget,
    TankHysteresis,
    StartDt,
    StopDt,
    CoolingTemp,
    CoolingHysteresis,
    BoilingTemp,
    BoilingHysteresis,
}

impl ThresholdField {
    pub const ALL: [ThresholdField; 8] = [
        Self::TankTarget,
        Self::TankHysteresis,
        Self::StartDt,
        Self::StopDt,
        Self::CoolingTemp,
        Self::CoolingHysteresis,
        Self::BoilingTemp,
        Self::BoilingHysteresis,
    ];

    /// Config key, also the last topic segment of an update command.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::TankTarget => "tank_target",
            Self::TankHysteresis => "tank_hysteresis",
            Self::StartDt => "start_dt",
            Self::StopDt => "stop_dt",
            Self::CoolingTemp => "cooling_temp",
            Self::CoolingHysteresis => "cooling_hysteresis",
            Self::BoilingTemp => "boiling_temp",
            Self::BoilingHysteresis => "boiling_hysteresis",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl ControlThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = ThresholdField::ALL.map(|f| (f, self.get(f)));
        if let Some((field, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!(
                "thresholds.{} must be finite, got {}",
                field.key(),
                value
            )));
        }
        if self.start_dt <= self.stop_dt {
            return Err(invalid(format!(
                "thresholds.start_dt {} must exceed stop_dt {}",
                self.start_dt, self.stop_dt
            )));
        }
        if self.boiling_temp <= self.cooling_temp {
            return Err(invalid(format!(
                "thresholds.boiling_temp {} must exceed cooling_temp {}",
                self.boiling_temp, self.cooling_temp
            )));
        }
        for (field, hyst) in [
            (ThresholdField::TankHysteresis, self.tank_hysteresis),
            (ThresholdField::CoolingHysteresis, self.cooling_hysteresis),
            (ThresholdField::BoilingHysteresis, self.boiling_hysteresis),
        ] {
            if hyst < 0.0 {
                return Err(invalid(format!(
                    "thresholds.{} {} must be >= 0",
                    field.key(),
                    hyst
                )));
            }
        }
        Ok(())
    }

    pub const fn get(&self, field: ThresholdField) -> f64 {
        match field {
            ThresholdField::TankTarget => self.tank_target,
            ThresholdField::TankHysteresis => self.tank_hysteresis,
            ThresholdField::StartDt => self.start_dt,
            ThresholdField::StopDt => self.stop_dt,
            ThresholdField::CoolingTemp => self.cooling_temp,
            ThresholdField::CoolingHysteresis => self.cooling_hysteresis,
            ThresholdField::BoilingTemp => self.boiling_temp,
            ThresholdField::BoilingHysteresis => self.boiling_hysteresis,
        }
    }

    /// Copy with one field replaced, validated as a whole.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` if the result would break an invariant;
    /// `self` is untouched either way.
    pub fn with_update(&self, field: ThresholdField, value: f64) -> Result<Self, ConfigError> {
        let mut next = *self;
        let slot = match field {
            ThresholdField::TankTarget => &mut next.tank_target,
            ThresholdField::TankHysteresis => &mut next.tank_hysteresis,
            ThresholdField::StartDt => &mut next.start_dt,
            ThresholdField::StopDt => &mut next.stop_dt,
            ThresholdField::CoolingTemp => &mut next.cooling_temp,
            ThresholdField::CoolingHysteresis => &mut next.cooling_hysteresis,
            ThresholdField::BoilingTemp => &mut next.boiling_temp,
            ThresholdField::BoilingHysteresis => &mut next.boiling_hysteresis,
        };
        *slot = value;
        next.validate()?;
        Ok(next)
    }
}

// ─── Heater ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaterConfig {
    /// Tank ceiling for switching the heater on [°C].
    #[serde(default = "default_temp_limit")]
    pub temp_limit: f64,
    /// Minimum time between two accepted switch commands [s].
    #[serde(default = "default_lockout_s")]
    pub lockout_s: f64,
}

fn default_temp_limit() -> f64 {
    HEATER_TEMP_LIMIT_DEFAULT
}
fn default_lockout_s() -> f64 {
    HEATER_LOCKOUT_S_DEFAULT
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            temp_limit: default_temp_limit(),
            lockout_s: default_lockout_s(),
        }
    }
}

impl HeaterConfig {
    #[inline]
    pub fn lockout(&self) -> Duration {
        Duration::from_secs_f64(self.lockout_s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.temp_limit.is_finite() {
            return Err(invalid("heater.temp_limit must be finite".to_string()));
        }
        if !self.lockout_s.is_finite() || self.lockout_s < 0.0 {
            return Err(invalid(format!(
                "heater.lockout_s {} must be a non-negative number",
                self.lockout_s
            )));
        }
        Ok(())
    }
}

// ─── Outputs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputsConfig {
    #[serde(default = "default_pump_binding")]
    pub pump: OutputBinding,
    #[serde(default = "default_heater_binding")]
    pub heater: OutputBinding,
}

fn default_pump_binding() -> OutputBinding {
    OutputBinding {
        pin: 1,
        wiring: RelayWiring::NormallyClosed,
    }
}
fn default_heater_binding() -> OutputBinding {
    OutputBinding {
        pin: 2,
        wiring: RelayWiring::NormallyClosed,
    }
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            pump: default_pump_binding(),
            heater: default_heater_binding(),
        }
    }
}

impl OutputsConfig {
    #[inline]
    pub const fn binding(&self, role: OutputRole) -> OutputBinding {
        match role {
            OutputRole::Pump => self.pump,
            OutputRole::Heater => self.heater,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pump.pin == self.heater.pin {
            return Err(invalid(format!(
                "outputs.pump and outputs.heater share relay {}",
                self.pump.pin
            )));
        }
        Ok(())
    }
}

// ─── Driver ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Registered driver name.
    #[serde(default = "default_driver_name")]
    pub name: String,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_driver_name() -> String {
    "simulation".to_string()
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: default_driver_name(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// First-order thermal model used by the simulation driver.
///
/// Rates are per second; losses and transfer are fractions of the
/// temperature difference removed per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub ambient_c: f64,
    pub initial_collector_c: f64,
    pub initial_tank_c: f64,
    /// Collector heating from irradiance [K/s].
    pub solar_gain: f64,
    /// Collector loss to ambient [1/s].
    pub collector_loss: f64,
    /// Collector ↔ tank exchange while the pump runs [1/s].
    pub transfer: f64,
    /// Tank heating from the auxiliary heater [K/s].
    pub heater_gain: f64,
    /// Tank loss to ambient [1/s].
    pub tank_loss: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ambient_c: 15.0,
            initial_collector_c: 20.0,
            initial_tank_c: 35.0,
            solar_gain: 0.2,
            collector_loss: 0.002,
            transfer: 0.01,
            heater_gain: 0.01,
            tank_loss: 0.0001,
        }
    }
}
