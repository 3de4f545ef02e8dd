mod calibration;
mod closed_loop;
mod commands;
mod degradation;
mod heater;
mod priority;

use solar_common::hal::types::SensorId;
use solar_control_unit::config::load_config_from_str;
use solar_control_unit::cycle::CycleRunner;
use solar_hal::drivers::simulation::{SimulationDriver, SimulationHandle};

pub const COLLECTOR: SensorId = SensorId::new(0, 1);
pub const TANK: SensorId = SensorId::new(0, 2);

/// Zero backoff keeps retries instant.
pub const FAST_RETRY: &str = r#"
[sensors.retry]
max_retries = 3
initial_backoff_ms = 0
max_backoff_ms = 0
"#;

/// Runner over a fresh simulation driver, config = `FAST_RETRY` + `extra`.
pub fn sim_runner(extra: &str) -> (CycleRunner, SimulationHandle) {
    let text = format!("{FAST_RETRY}\n{extra}");
    let loaded = load_config_from_str(&text).expect("valid test config");
    let driver = SimulationDriver::new();
    let handle = driver.handle();
    let runner = CycleRunner::new(loaded, Box::new(driver)).expect("runner starts");
    (runner, handle)
}

pub fn pin(handle: &SimulationHandle, collector: f64, tank: f64) {
    handle.set_temperature(COLLECTOR, collector);
    handle.set_temperature(TANK, tank);
}
