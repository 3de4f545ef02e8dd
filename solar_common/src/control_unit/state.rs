//! Operating mode and owned control state.
//!
//! `ControlState` is owned by the control engine and `HeaterState` by the
//! heater guard; both live from process start to process end and are never
//! reset in between. Other components read them through `ControlSnapshot`.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Reported operating mode (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Mode {
    /// No usable temperature snapshot evaluated yet. Pump off.
    #[default]
    Startup = 0,
    /// Operator drives the pump directly.
    Manual = 1,
    /// Collector at or above boiling threshold. Pump off.
    Overheated = 2,
    /// Collector above cooling threshold. Pump forced on.
    CollectorCooling = 3,
    /// Normal ΔT-driven charging of the tank.
    Heating = 4,
    /// Normal control, nothing to harvest.
    Standby = 5,
}

impl Mode {
    /// Short human-readable code for log lines.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Manual => "manual",
            Self::Overheated => "overheated",
            Self::CollectorCooling => "collector_cooling",
            Self::Heating => "heating",
            Self::Standby => "standby",
        }
    }

    /// Whether the mode is driven by a protection rule.
    #[inline]
    pub const fn is_protective(&self) -> bool {
        matches!(self, Self::Overheated | Self::CollectorCooling)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State owned by the control engine, mutated once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub mode: Mode,
    pub pump_on: bool,
    /// Latched boiling protection, released below `boiling - boiling_hysteresis`.
    pub overheated: bool,
    /// Latched cooling protection, released below `cooling - cooling_hysteresis`.
    pub collector_cooling_active: bool,
    pub manual_control: bool,
}

/// State owned by the heater guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaterState {
    pub heater_on: bool,
    /// Time of the last accepted switch command.
    pub last_command_time: Option<Instant>,
}

/// Immutable copy of the control and heater state for readers outside the
/// control loop (status publishing, alerting, dashboards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub mode: Mode,
    pub pump_on: bool,
    pub overheated: bool,
    pub collector_cooling_active: bool,
    pub manual_control: bool,
    pub heater_on: bool,
}

impl ControlSnapshot {
    pub fn new(control: &ControlState, heater: &HeaterState) -> Self {
        Self {
            mode: control.mode,
            pump_on: control.pump_on,
            overheated: control.overheated,
            collector_cooling_active: control.collector_cooling_active,
            manual_control: control.manual_control,
            heater_on: heater.heater_on,
        }
    }
}
