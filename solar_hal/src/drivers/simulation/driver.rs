//! Simulation driver implementation.
//!
//! `SimulationDriver` implements `HalDriver` on top of [`ThermalModel`].
//! Sensor reads return PT1000 resistance in kΩ, the unit the acquisition
//! boards report. A cloneable [`SimulationHandle`] shares the driver state so
//! tests can steer temperatures and inject faults after the driver has been
//! boxed into the control loop.

use super::thermal::{ThermalModel, pt1000_resistance};
use parking_lot::Mutex;
use solar_common::control_unit::config::{OutputsConfig, SimulationConfig, SolarConfig};
use solar_common::hal::driver::{DriverDiagnostics, HalDriver, HalError};
use solar_common::hal::types::{OutputRole, RelayLevel, SensorId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// What a simulated channel measures.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Channel {
    Collector,
    Tank,
    Ambient,
}

#[derive(Debug)]
struct SimState {
    initialized: bool,
    model: ThermalModel,
    channels: HashMap<SensorId, Channel>,
    outputs: OutputsConfig,
    levels: HashMap<OutputRole, RelayLevel>,
    fault_sentinel: f64,
    overrides: HashMap<SensorId, f64>,
    pending_failures: HashMap<SensorId, u32>,
    disconnected: HashSet<SensorId>,
    diagnostics: DriverDiagnostics,
}

impl SimState {
    fn new() -> Self {
        Self {
            initialized: false,
            model: ThermalModel::new(SimulationConfig::default()),
            channels: HashMap::new(),
            outputs: OutputsConfig::default(),
            levels: HashMap::new(),
            fault_sentinel: 0.0,
            overrides: HashMap::new(),
            pending_failures: HashMap::new(),
            disconnected: HashSet::new(),
            diagnostics: DriverDiagnostics::default(),
        }
    }

    fn is_on(&self, role: OutputRole) -> bool {
        self.levels
            .get(&role)
            .is_some_and(|&level| self.outputs.binding(role).wiring.logical_for(level))
    }

    fn temperature_of(&self, sensor: SensorId) -> Option<f64> {
        if let Some(&forced) = self.overrides.get(&sensor) {
            return Some(forced);
        }
        let channel = self.channels.get(&sensor)?;
        Some(match channel {
            Channel::Collector => self.model.collector_c(),
            Channel::Tank => self.model.tank_c(),
            Channel::Ambient => self.model.ambient_c(),
        })
    }

    fn read(&mut self, sensor: SensorId) -> Result<f64, HalError> {
        self.diagnostics.reads += 1;
        let result = self.read_inner(sensor);
        if result.is_err() {
            self.diagnostics.read_errors += 1;
        }
        result
    }

    fn read_inner(&mut self, sensor: SensorId) -> Result<f64, HalError> {
        if !self.initialized {
            return Err(HalError::InitFailed("driver not initialized".to_string()));
        }
        if !self.channels.contains_key(&sensor) && !self.overrides.contains_key(&sensor) {
            return Err(HalError::UnknownSensor(sensor));
        }
        if let Some(left) = self.pending_failures.get_mut(&sensor) {
            if *left > 0 {
                *left -= 1;
                return Err(HalError::ReadFailed {
                    sensor,
                    reason: "simulated bus error".to_string(),
                });
            }
        }
        if self.disconnected.contains(&sensor) {
            return Ok(self.fault_sentinel);
        }
        let temp = self
            .temperature_of(sensor)
            .ok_or(HalError::UnknownSensor(sensor))?;
        Ok(pt1000_resistance(temp) / 1000.0)
    }
}

/// Simulation driver implementing the `HalDriver` trait.
pub struct SimulationDriver {
    name: &'static str,
    version: &'static str,
    state: Arc<Mutex<SimState>>,
}

impl SimulationDriver {
    /// Create an uninitialized simulation driver.
    pub fn new() -> Self {
        Self {
            name: super::DRIVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            state: Arc::new(Mutex::new(SimState::new())),
        }
    }

    /// Shared handle for steering the simulation from outside the loop.
    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HalDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &SolarConfig) -> Result<(), HalError> {
        let sensors = &config.sensors;
        let mut channels = HashMap::new();
        channels.insert(sensors.collector, Channel::Collector);
        channels.insert(sensors.tank, Channel::Tank);
        for aux in &sensors.auxiliary {
            channels.insert(aux.id(), Channel::Ambient);
        }

        info!(
            "Initializing simulation driver with {} sensors, pump relay {}, heater relay {}",
            channels.len(),
            config.outputs.pump.pin,
            config.outputs.heater.pin
        );

        let mut state = self.state.lock();
        state.model = ThermalModel::new(config.driver.simulation);
        state.channels = channels;
        state.outputs = config.outputs;
        state.levels.clear();
        state.fault_sentinel = config.calibration.fault_sentinel;
        state.initialized = true;
        Ok(())
    }

    fn read_sensor(&self, sensor: SensorId) -> Result<f64, HalError> {
        let raw = self.state.lock().read(sensor);
        trace!(%sensor, ?raw, "simulated read");
        raw
    }

    fn write_output(
        &mut self,
        role: OutputRole,
        pin: u8,
        level: RelayLevel,
    ) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(HalError::WriteFailed {
                role,
                reason: "driver not initialized".to_string(),
            });
        }
        let expected = state.outputs.binding(role).pin;
        if pin != expected {
            return Err(HalError::WriteFailed {
                role,
                reason: format!("relay {pin} is not bound (expected {expected})"),
            });
        }
        state.diagnostics.writes += 1;
        state.levels.insert(role, level);
        Ok(())
    }

    fn tick(&mut self, dt: Duration) {
        let mut state = self.state.lock();
        let (pump, heater) = (state.is_on(OutputRole::Pump), state.is_on(OutputRole::Heater));
        state.model.step(dt, pump, heater);
        debug!(
            collector = state.model.collector_c(),
            tank = state.model.tank_c(),
            pump,
            heater,
            "simulation tick"
        );
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutting down simulation driver");
        self.state.lock().initialized = false;
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        Some(self.state.lock().diagnostics.clone())
    }
}

/// Shared view of a [`SimulationDriver`]'s state.
#[derive(Clone)]
pub struct SimulationHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulationHandle {
    /// Pin a sensor to a fixed temperature, bypassing the model.
    pub fn set_temperature(&self, sensor: SensorId, temp_c: f64) {
        self.state.lock().overrides.insert(sensor, temp_c);
    }

    /// Return a pinned sensor to the model.
    pub fn clear_temperature(&self, sensor: SensorId) {
        self.state.lock().overrides.remove(&sensor);
    }

    /// Force the model's collector and tank temperatures.
    pub fn set_model_temperatures(&self, collector_c: f64, tank_c: f64) {
        self.state.lock().model.set_temperatures(collector_c, tank_c);
    }

    /// Set relative solar input (0.0 to 1.0).
    pub fn set_irradiance(&self, irradiance: f64) {
        self.state.lock().model.set_irradiance(irradiance);
    }

    /// Make the next `count` reads of `sensor` fail.
    pub fn inject_failures(&self, sensor: SensorId, count: u32) {
        self.state.lock().pending_failures.insert(sensor, count);
    }

    /// Report the fault sentinel for `sensor` until reconnected.
    pub fn disconnect(&self, sensor: SensorId) {
        self.state.lock().disconnected.insert(sensor);
    }

    /// Undo [`disconnect`](Self::disconnect) and pending injected failures.
    pub fn reconnect(&self, sensor: SensorId) {
        let mut state = self.state.lock();
        state.disconnected.remove(&sensor);
        state.pending_failures.remove(&sensor);
    }

    /// Last level written to a role, `None` if never written.
    pub fn level(&self, role: OutputRole) -> Option<RelayLevel> {
        self.state.lock().levels.get(&role).copied()
    }

    /// Logical state of a role as seen by the plant.
    pub fn is_on(&self, role: OutputRole) -> bool {
        self.state.lock().is_on(role)
    }

    /// Model collector temperature [°C].
    pub fn collector_temp(&self) -> f64 {
        self.state.lock().model.collector_c()
    }

    /// Model tank temperature [°C].
    pub fn tank_temp(&self) -> f64 {
        self.state.lock().model.tank_c()
    }
}
