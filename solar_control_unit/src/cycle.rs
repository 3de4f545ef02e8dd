//! One control cycle: read → classify → decide → actuate.
//!
//! ## Cycle Body
//! 1. Bulk-read every configured sensor (one thread per sensor).
//! 2. Abandon without actuation if cancellation was requested meanwhile.
//! 3. Classify each result through the health monitor. The engine gets the
//!    surfaced value: fresh, last-known-good while Degraded, `None` once Failed.
//! 4. Evaluate the control engine. Unusable input holds the previous state.
//! 5. Force the heater off if the tank is at the ceiling or unusable.
//! 6. Write one `Actuation` through the output bank.
//! 7. Log sensors past the alert threshold.
//!
//! Commands are applied between cycles through [`CycleRunner::handle_command`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use solar_common::config::ConfigError;
use solar_common::control_unit::config::{ControlThresholds, HeaterConfig};
use solar_common::control_unit::sensor::{HealthSummary, SensorSample};
use solar_common::control_unit::state::{ControlSnapshot, ControlState};
use solar_common::hal::driver::{HalDriver, HalError};
use solar_common::hal::types::{Actuation, SensorId};
use solar_hal::OutputBank;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::command::{Command, CommandError};
use crate::config::LoadedConfig;
use crate::control::{ControlEngine, EngineInputs};
use crate::safety::HeaterGuard;
use crate::sensor::{RetryPolicy, SensorHealthMonitor, SensorReader};
use crate::status::StatusDocument;

// ─── Errors ─────────────────────────────────────────────────────────

/// Failure while bringing the runner up. Nothing after startup returns this.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("driver '{driver}' failed to initialize: {source}")]
    Driver {
        driver: &'static str,
        #[source]
        source: HalError,
    },
}

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Counters since start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Completed cycles, including skipped ones.
    pub cycles: u64,
    /// Cycles where the engine held state on unusable input.
    pub skipped: u64,
    /// Cycles abandoned before actuation.
    pub cancelled: u64,
    /// Commands that failed to decode or apply.
    pub rejected_commands: u64,
    /// Output writes that failed.
    pub actuation_errors: u64,
}

/// Result of one completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    pub samples: Vec<SensorSample>,
    pub collector_temp: Option<f64>,
    pub tank_temp: Option<f64>,
    pub state: ControlState,
    pub heater_on: bool,
    pub actuation: Actuation,
    /// Engine held state this cycle.
    pub skipped: bool,
    pub health: HealthSummary,
}

impl CycleReport {
    /// Collector minus tank, when both are usable.
    pub fn dt(&self) -> Option<f64> {
        Some(self.collector_temp? - self.tank_temp?)
    }

    pub fn status(&self) -> StatusDocument {
        StatusDocument {
            mode: self.state.mode,
            pump_on: self.state.pump_on,
            overheated: self.state.overheated,
            collector_cooling_active: self.state.collector_cooling_active,
            dt: self.dt(),
            heater_on: self.heater_on,
            collector_temp: self.collector_temp,
            tank_temp: self.tank_temp,
            sensor_health_summary: self.health.clone(),
        }
    }
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Owns every piece of runtime state. Single-threaded; one cycle at a time.
pub struct CycleRunner {
    driver: Box<dyn HalDriver>,
    reader: SensorReader,
    health: SensorHealthMonitor,
    engine: ControlEngine,
    heater: HeaterGuard,
    outputs: OutputBank,
    thresholds: ControlThresholds,
    heater_config: HeaterConfig,
    alert_threshold: u32,
    collector: SensorId,
    tank: SensorId,
    sensors: Vec<SensorId>,
    /// `Some(pump_on)` while manual mode is active.
    manual_pump: Option<bool>,
    /// Tank value surfaced in the last cycle, for heater commands.
    last_tank: Option<f64>,
    stats: CycleStats,
}

impl CycleRunner {
    /// Initialize `driver` and assemble the runtime.
    pub fn new(loaded: LoadedConfig, mut driver: Box<dyn HalDriver>) -> Result<Self, StartupError> {
        let LoadedConfig {
            config,
            calibration,
        } = loaded;

        driver.init(&config).map_err(|source| StartupError::Driver {
            driver: driver.name(),
            source,
        })?;
        info!(driver = driver.name(), version = driver.version(), "driver initialized");

        let policy = RetryPolicy::from(&config.sensors.retry);
        if policy.worst_case_delay() >= config.cycle.interval() {
            warn!(
                worst_case = ?policy.worst_case_delay(),
                interval = ?config.cycle.interval(),
                "sensor retry budget can exceed the cycle interval"
            );
        }

        Ok(Self {
            reader: SensorReader::new(calibration, config.sensors.plausible, policy),
            health: SensorHealthMonitor::new(config.sensors.health.stale_threshold()),
            engine: ControlEngine::new(),
            heater: HeaterGuard::new(config.heater.lockout()),
            outputs: OutputBank::new(config.outputs),
            thresholds: config.thresholds,
            heater_config: config.heater,
            alert_threshold: config.sensors.health.alert_threshold,
            collector: config.sensors.collector,
            tank: config.sensors.tank,
            sensors: config.sensors.all_ids(),
            manual_pump: None,
            last_tank: None,
            stats: CycleStats::default(),
            driver,
        })
    }

    #[inline]
    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    #[inline]
    pub fn thresholds(&self) -> &ControlThresholds {
        &self.thresholds
    }

    #[inline]
    pub fn health(&self) -> &SensorHealthMonitor {
        &self.health
    }

    #[inline]
    pub fn manual_pump(&self) -> Option<bool> {
        self.manual_pump
    }

    /// Immutable view of control and heater state.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot::new(&self.engine.state(), &self.heater.state())
    }

    /// Advance the plant model (no-op on real hardware).
    pub fn tick(&mut self, dt: Duration) {
        self.driver.tick(dt);
    }

    /// Run one cycle. `None` if `cancel` was set before actuation.
    pub fn run_cycle(&mut self, cancel: &AtomicBool) -> Option<CycleReport> {
        let readings = self.reader.read_all(&*self.driver, &self.sensors, cancel);
        if cancel.load(Ordering::Relaxed) {
            self.stats.cancelled += 1;
            info!("cycle abandoned before actuation");
            return None;
        }

        let now = Instant::now();
        let samples: Vec<SensorSample> = self
            .sensors
            .iter()
            .map(|&id| {
                let (value, attempts) = readings.get(&id).copied().unwrap_or((None, 0));
                let sample = self.health.record_reading_at(id, value, now);
                debug!(sensor = %id, ?value, attempts, status = ?sample.status, "sensor sample");
                sample
            })
            .collect();

        let surfaced = |id: SensorId| {
            samples
                .iter()
                .find(|s| s.sensor_id == id)
                .and_then(SensorSample::usable_value)
        };
        let collector_temp = surfaced(self.collector);
        let tank_temp = surfaced(self.tank);
        self.last_tank = tank_temp;

        let inputs = EngineInputs {
            collector_temp,
            tank_temp,
            manual_override: self.manual_pump,
        };
        let skipped = self.engine.evaluate(inputs, &self.thresholds).is_err();
        if skipped {
            self.stats.skipped += 1;
        }

        self.enforce_heater_ceiling(tank_temp, now);

        let state = self.engine.state();
        let actuation = Actuation {
            pump_on: state.pump_on,
            heater_on: self.heater.is_on(),
        };
        self.write_outputs(actuation);

        for sample in &samples {
            if self.health.should_alert(sample.sensor_id, self.alert_threshold) {
                let failures = self
                    .health
                    .record(sample.sensor_id)
                    .map_or(0, |r| r.consecutive_failures());
                warn!(sensor = %sample.sensor_id, failures, "sensor alert");
            }
        }

        self.stats.cycles += 1;
        Some(CycleReport {
            cycle: self.stats.cycles,
            samples,
            collector_temp,
            tank_temp,
            state,
            heater_on: actuation.heater_on,
            actuation,
            skipped,
            health: self.health.sensor_health_summary(),
        })
    }

    fn enforce_heater_ceiling(&mut self, tank_temp: Option<f64>, now: Instant) {
        if !self.heater.is_on() {
            return;
        }
        match tank_temp {
            Some(t) if t < self.heater_config.temp_limit => {}
            Some(t) => {
                warn!(tank = t, limit = self.heater_config.temp_limit, "tank at heater limit");
                self.heater.force_off(now);
            }
            None => {
                warn!("tank temperature unusable with heater on");
                self.heater.force_off(now);
            }
        }
    }

    fn write_outputs(&mut self, actuation: Actuation) {
        if let Err(e) = self.outputs.apply(self.driver.as_mut(), actuation) {
            self.stats.actuation_errors += 1;
            error!(error = %e, "actuation failed");
        }
    }

    /// Apply one inbound command.
    ///
    /// Rejections are counted and logged and leave all state unchanged.
    pub fn handle_command(&mut self, command: Command, now: Instant) -> Result<(), CommandError> {
        let result = self.apply_command(command, now);
        match &result {
            Ok(()) => debug!(?command, "command applied"),
            Err(e) => {
                self.stats.rejected_commands += 1;
                warn!(?command, error = %e, "command rejected");
            }
        }
        result
    }

    /// Decode and apply a `"<topic> <payload>"` line.
    pub fn handle_line(&mut self, line: &str, now: Instant) -> Result<(), CommandError> {
        match Command::parse_line(line) {
            Ok(command) => self.handle_command(command, now),
            Err(e) => {
                self.stats.rejected_commands += 1;
                warn!(line, error = %e, "command not understood");
                Err(e)
            }
        }
    }

    fn apply_command(&mut self, command: Command, now: Instant) -> Result<(), CommandError> {
        match command {
            Command::ManualMode(true) => {
                if self.manual_pump.is_none() {
                    let pump_on = self.engine.state().pump_on;
                    self.manual_pump = Some(pump_on);
                    info!(pump_on, "manual mode on");
                }
            }
            Command::ManualMode(false) => {
                if self.manual_pump.take().is_some() {
                    info!("manual mode off");
                }
            }
            Command::ManualPump(pump_on) => {
                let slot = self
                    .manual_pump
                    .as_mut()
                    .ok_or(CommandError::NotInManualMode)?;
                *slot = pump_on;
                info!(pump_on, "manual pump set");
            }
            Command::Heater(turn_on) => {
                let tank = match (turn_on, self.last_tank) {
                    (true, None) => return Err(CommandError::TankUnavailable),
                    (_, tank) => tank.unwrap_or(f64::NAN),
                };
                let was_on = self.heater.is_on();
                self.heater
                    .request(turn_on, tank, self.heater_config.temp_limit, now)?;
                if self.heater.is_on() != was_on {
                    let actuation = Actuation {
                        pump_on: self.engine.state().pump_on,
                        heater_on: self.heater.is_on(),
                    };
                    self.write_outputs(actuation);
                }
            }
            Command::Threshold(field, value) => {
                self.thresholds = self.thresholds.with_update(field, value)?;
                info!(field = field.key(), value, "threshold updated");
            }
        }
        Ok(())
    }

    /// Drive every output off and release the driver.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        info!(stats = ?self.stats, "shutting down control unit");
        if let Err(e) = self.outputs.all_off(self.driver.as_mut()) {
            error!(error = %e, "failed to switch outputs off");
        }
        self.driver.shutdown()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
