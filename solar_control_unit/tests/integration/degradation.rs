//! Integration test: sensor faults through the full cycle.
//!
//! 1. Transient read errors are absorbed by retries
//! 2. Exhausted retries fall back to the last known good value (Degraded)
//! 3. Once the staleness window passes the sensor is Failed and the engine
//!    holds its previous state
//! 4. A disconnected channel reports the fault sentinel and is never calibrated

use std::sync::atomic::AtomicBool;

use solar_common::control_unit::sensor::SensorStatus;
use solar_common::control_unit::state::Mode;
use solar_common::hal::types::{OutputRole, SensorId};
use solar_control_unit::cycle::CycleReport;

use super::{COLLECTOR, TANK, pin, sim_runner};

fn go() -> AtomicBool {
    AtomicBool::new(false)
}

/// Simulated PT1000 readings land within a few tenths of the set point.
fn near(value: Option<f64>, expected: f64) -> bool {
    value.is_some_and(|v| (v - expected).abs() < 0.3)
}

fn status_of(report: &CycleReport, id: SensorId) -> SensorStatus {
    report
        .samples
        .iter()
        .find(|s| s.sensor_id == id)
        .map(|s| s.status)
        .unwrap()
}

#[test]
fn transient_failures_are_retried() {
    let (mut runner, sim) = sim_runner("");
    pin(&sim, 50.0, 30.0);
    sim.inject_failures(TANK, 2);

    let report = runner.run_cycle(&go()).unwrap();
    assert_eq!(status_of(&report, TANK), SensorStatus::Healthy);
    assert!(near(report.tank_temp, 30.0));
    assert!(report.state.pump_on);
}

#[test]
fn degraded_sensor_keeps_control_running() {
    let (mut runner, sim) = sim_runner("[sensors.health]\nstale_threshold_s = 3600.0");
    pin(&sim, 50.0, 30.0);
    let first = runner.run_cycle(&go()).unwrap();

    // every attempt of the next cycle fails
    sim.inject_failures(TANK, 3);
    let report = runner.run_cycle(&go()).unwrap();

    assert_eq!(status_of(&report, TANK), SensorStatus::Degraded);
    assert_eq!(report.tank_temp, first.tank_temp);
    assert!(!report.skipped);
    assert_eq!(report.state.mode, Mode::Heating);
    assert_eq!(report.health.degraded_sensors, vec![TANK]);

    let status = report.status();
    assert_eq!(status.sensor_health_summary.degraded, 1);
    assert!(near(status.dt, 20.0));
}

#[test]
fn stale_sensor_fails_and_engine_holds() {
    let (mut runner, sim) = sim_runner("[sensors.health]\nstale_threshold_s = 0.0");
    pin(&sim, 50.0, 30.0);
    let first = runner.run_cycle(&go()).unwrap();
    assert!(first.state.pump_on);

    sim.disconnect(COLLECTOR);
    let report = runner.run_cycle(&go()).unwrap();

    assert_eq!(status_of(&report, COLLECTOR), SensorStatus::Failed);
    assert_eq!(report.collector_temp, None);
    assert!(report.skipped);
    assert_eq!(report.state, first.state);
    assert!(sim.is_on(OutputRole::Pump));
    assert_eq!(report.status().dt, None);
    assert_eq!(runner.stats().skipped, 1);
}

#[test]
fn never_read_sensor_starts_failed() {
    let (mut runner, sim) = sim_runner("");
    pin(&sim, 50.0, 30.0);
    sim.disconnect(TANK);

    let report = runner.run_cycle(&go()).unwrap();
    assert_eq!(status_of(&report, TANK), SensorStatus::Failed);
    assert!(report.skipped);
    assert_eq!(report.state.mode, Mode::Startup);
    assert!(!report.actuation.pump_on);
    // pump relay still written: logical off
    assert!(!sim.is_on(OutputRole::Pump));
    assert!(sim.level(OutputRole::Pump).is_some());
}

#[test]
fn alert_threshold_tracks_consecutive_failures() {
    let (mut runner, sim) = sim_runner("[sensors.health]\nalert_threshold = 2");
    pin(&sim, 50.0, 30.0);
    sim.disconnect(TANK);

    runner.run_cycle(&go()).unwrap();
    assert!(!runner.health().should_alert(TANK, 2));
    runner.run_cycle(&go()).unwrap();
    assert!(runner.health().should_alert(TANK, 2));

    sim.reconnect(TANK);
    runner.run_cycle(&go()).unwrap();
    assert!(!runner.health().should_alert(TANK, 2));
    assert_eq!(runner.health().record(TANK).unwrap().consecutive_failures(), 0);
}

#[test]
fn implausible_values_are_failures() {
    let (mut runner, sim) = sim_runner("[sensors.plausible]\nmin = -20.0\nmax = 120.0");
    pin(&sim, 130.0, 30.0);
    let report = runner.run_cycle(&go()).unwrap();
    assert_eq!(status_of(&report, COLLECTOR), SensorStatus::Failed);
    assert!(report.skipped);
}
