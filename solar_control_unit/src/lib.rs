//! # Solar Control Unit Library
//!
//! Control brain for a solar-thermal collector loop. Each cycle reads the
//! resistance sensors, converts them through a piecewise calibration table,
//! masks short faults behind last-known-good values, then runs the
//! priority-ordered pump state machine and the heater guard.
//!
//! ## Data Flow
//!
//! ```text
//! HalDriver ──► SensorReader ──► SensorHealthMonitor ──► ControlEngine ──┐
//!               (calibration,     (Healthy / Degraded /                  ├─► OutputBank
//!                retry/backoff)    Failed)                 HeaterGuard ──┘
//! ```
//!
//! ## Rule Precedence
//!
//! 1. **Manual** override of the pump
//! 2. **Reverse-flow** guard (collector colder than tank)
//! 3. **Overheated** collector, pump off until it cools by the hysteresis
//! 4. **CollectorCooling**, pump forced on
//! 5. **Heating / Standby** by ΔT with a dead band
//!
//! Faults never stop the process. Unusable temperatures hold the previous
//! pump state; the heater falls back to off.

pub mod calibration;
pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod safety;
pub mod sensor;
pub mod status;
