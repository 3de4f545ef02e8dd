//! Pump state machine, evaluated once per cycle.
//!
//! Rules in strict precedence, first match wins:
//!
//! 1. manual override → pump as requested, `Manual`
//! 2. collector colder than tank → pump off, `Standby`
//! 3. collector ≥ boiling (latched until below boiling − hysteresis) → pump off, `Overheated`
//! 4. collector ≥ cooling (latched until below cooling − hysteresis) → pump on, `CollectorCooling`
//! 5. ΔT hysteresis: start at `start_dt` while the tank is below target, stop
//!    at `stop_dt` or a full tank, otherwise keep the previous pump state
//!
//! `Startup` is reported until the first cycle with usable temperatures.

use solar_common::control_unit::config::ControlThresholds;
use solar_common::control_unit::error::{ControlError, ControlResult, TemperatureInput};
use solar_common::control_unit::state::{ControlState, Mode};
use tracing::{debug, info, warn};

/// Everything one evaluation reads besides thresholds and own state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineInputs {
    pub collector_temp: Option<f64>,
    pub tank_temp: Option<f64>,
    /// `Some(pump_on)` while manual mode is active.
    pub manual_override: Option<bool>,
}

/// Sole owner of [`ControlState`].
#[derive(Debug, Clone, Default)]
pub struct ControlEngine {
    state: ControlState,
}

impl ControlEngine {
    /// Fresh engine in `Startup` with the pump off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state.
    #[inline]
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Run one evaluation.
    ///
    /// # Errors
    /// `ControlError::UnusableInput` when manual mode is off and a
    /// temperature is missing or non-finite. Pump state and mode are left as
    /// they were.
    pub fn evaluate(
        &mut self,
        inputs: EngineInputs,
        thresholds: &ControlThresholds,
    ) -> ControlResult<ControlState> {
        let before = self.state;
        let st = &mut self.state;

        // Rule 1
        st.manual_control = inputs.manual_override.is_some();
        if let Some(pump_on) = inputs.manual_override {
            st.pump_on = pump_on;
            st.mode = Mode::Manual;
            return Ok(self.finish(before));
        }

        let collector = usable(inputs.collector_temp, TemperatureInput::Collector);
        let tank = usable(inputs.tank_temp, TemperatureInput::Tank);
        let (c, t) = match (collector, tank) {
            (Ok(c), Ok(t)) => (c, t),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    error = %e,
                    mode = %st.mode,
                    pump_on = st.pump_on,
                    "control cycle skipped"
                );
                return Err(e);
            }
        };

        // Latch release
        if st.overheated && c < thresholds.boiling_temp - thresholds.boiling_hysteresis {
            st.overheated = false;
            info!(collector = c, "overheat cleared");
        }
        if st.collector_cooling_active && c < thresholds.cooling_temp - thresholds.cooling_hysteresis
        {
            st.collector_cooling_active = false;
            info!(collector = c, "collector cooling cleared");
        }

        // Rule 2
        if c < t {
            st.pump_on = false;
            st.mode = Mode::Standby;
            return Ok(self.finish(before));
        }

        // Rule 3
        if c >= thresholds.boiling_temp {
            st.overheated = true;
        }
        if st.overheated {
            st.pump_on = false;
            st.mode = Mode::Overheated;
            return Ok(self.finish(before));
        }

        // Rule 4
        if c >= thresholds.cooling_temp {
            st.collector_cooling_active = true;
        }
        if st.collector_cooling_active {
            st.pump_on = true;
            st.mode = Mode::CollectorCooling;
            return Ok(self.finish(before));
        }

        // Rule 5
        let dt = c - t;
        if dt >= thresholds.start_dt && t < thresholds.tank_target - thresholds.tank_hysteresis {
            st.pump_on = true;
        } else if dt <= thresholds.stop_dt
            || (t >= thresholds.tank_target && c < thresholds.cooling_temp)
        {
            st.pump_on = false;
        }
        st.mode = if st.pump_on {
            Mode::Heating
        } else {
            Mode::Standby
        };
        Ok(self.finish(before))
    }

    fn finish(&self, before: ControlState) -> ControlState {
        let now = self.state;
        if now.mode != before.mode || now.pump_on != before.pump_on {
            info!(
                from = %before.mode,
                to = %now.mode,
                pump_on = now.pump_on,
                "mode transition"
            );
        } else {
            debug!(mode = %now.mode, pump_on = now.pump_on, "mode unchanged");
        }
        now
    }
}

fn usable(temp: Option<f64>, which: TemperatureInput) -> ControlResult<f64> {
    temp.filter(|v| v.is_finite())
        .ok_or(ControlError::UnusableInput(which))
}

// ─── Tests ──────────────────────────────────────────────────────────
