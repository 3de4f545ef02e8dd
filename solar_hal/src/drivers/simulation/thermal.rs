//! Lumped thermal model of collector and storage tank.

use solar_common::control_unit::config::SimulationConfig;
use std::time::Duration;

// Callendar–Van Dusen coefficients (IEC 60751).
const CVD_R0: f64 = 1000.0;
const CVD_A: f64 = 3.9083e-3;
const CVD_B: f64 = -5.775e-7;
const CVD_C: f64 = -4.183e-12;

/// Integration step upper bound [s].
const MAX_STEP_S: f64 = 1.0;

/// PT1000 resistance [Ω] at `temp_c`.
pub fn pt1000_resistance(temp_c: f64) -> f64 {
    let t = temp_c;
    let mut r = 1.0 + CVD_A * t + CVD_B * t * t;
    if t < 0.0 {
        r += CVD_C * (t - 100.0) * t * t * t;
    }
    CVD_R0 * r
}

/// Two-node model: the collector gains from irradiance and loses to ambient,
/// the tank gains from the heater and loses to ambient, and the pump
/// exchanges heat between them.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalModel {
    params: SimulationConfig,
    collector_c: f64,
    tank_c: f64,
    /// Relative solar input, 0.0 (night) to 1.0 (full sun).
    irradiance: f64,
}

impl ThermalModel {
    /// Start from the configured initial temperatures under full sun.
    pub fn new(params: SimulationConfig) -> Self {
        Self {
            collector_c: params.initial_collector_c,
            tank_c: params.initial_tank_c,
            irradiance: 1.0,
            params,
        }
    }

    /// Collector temperature [°C].
    #[inline]
    pub fn collector_c(&self) -> f64 {
        self.collector_c
    }

    /// Tank temperature [°C].
    #[inline]
    pub fn tank_c(&self) -> f64 {
        self.tank_c
    }

    /// Ambient temperature [°C].
    #[inline]
    pub fn ambient_c(&self) -> f64 {
        self.params.ambient_c
    }

    /// Set relative solar input, clamped to `[0, 1]`.
    pub fn set_irradiance(&mut self, irradiance: f64) {
        self.irradiance = irradiance.clamp(0.0, 1.0);
    }

    /// Force both node temperatures.
    pub fn set_temperatures(&mut self, collector_c: f64, tank_c: f64) {
        self.collector_c = collector_c;
        self.tank_c = tank_c;
    }

    /// Advance by `dt`, sub-stepping so that no explicit Euler step exceeds
    /// one second.
    pub fn step(&mut self, dt: Duration, pump_on: bool, heater_on: bool) {
        let mut remaining = dt.as_secs_f64();
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP_S);
            self.euler(h, pump_on, heater_on);
            remaining -= h;
        }
    }

    fn euler(&mut self, h: f64, pump_on: bool, heater_on: bool) {
        let p = &self.params;
        let mut d_collector =
            p.solar_gain * self.irradiance - p.collector_loss * (self.collector_c - p.ambient_c);
        let mut d_tank = -p.tank_loss * (self.tank_c - p.ambient_c);
        if heater_on {
            d_tank += p.heater_gain;
        }
        if pump_on {
            let q = p.transfer * (self.collector_c - self.tank_c);
            d_collector -= q;
            d_tank += q;
        }
        self.collector_c += d_collector * h;
        self.tank_c += d_tank * h;
    }
}
