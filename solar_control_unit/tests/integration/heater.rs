//! Integration test: heater guard on its own and inside the cycle.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use solar_common::control_unit::error::HeaterError;
use solar_common::hal::types::{OutputRole, RelayLevel};
use solar_control_unit::command::{Command, CommandError};
use solar_control_unit::safety::HeaterGuard;

use super::{TANK, pin, sim_runner};

#[test]
fn lockout_window_is_five_seconds() {
    let mut guard = HeaterGuard::default();
    let t0 = Instant::now();
    guard.request(true, 40.0, 80.0, t0).unwrap();
    guard.force_off(t0);
    // force_off stamps the time as well
    assert!(matches!(
        guard.request(true, 40.0, 80.0, t0 + Duration::from_millis(4_900)),
        Err(HeaterError::Lockout(_))
    ));
    assert_eq!(
        guard.request(true, 40.0, 80.0, t0 + Duration::from_secs(5)),
        Ok(())
    );
}

#[test]
fn temp_ceiling_always_wins() {
    let mut guard = HeaterGuard::default();
    for secs in [0, 1, 10, 100] {
        let now = Instant::now() + Duration::from_secs(secs);
        assert!(matches!(
            guard.request(true, 85.0, 80.0, now),
            Err(HeaterError::TempLimitExceeded { .. })
        ));
        assert!(!guard.is_on());
    }
}

#[test]
fn cycle_turns_heater_off_at_limit() {
    let (mut runner, sim) = sim_runner("[heater]\ntemp_limit = 60.0\nlockout_s = 3600.0");
    pin(&sim, 20.0, 40.0);
    runner.run_cycle(&AtomicBool::new(false)).unwrap();
    runner
        .handle_command(Command::Heater(true), Instant::now())
        .unwrap();
    assert!(sim.is_on(OutputRole::Heater));
    assert_eq!(sim.level(OutputRole::Heater), Some(RelayLevel::Low));

    pin(&sim, 20.0, 61.0);
    let report = runner.run_cycle(&AtomicBool::new(false)).unwrap();
    assert!(!report.heater_on);
    assert!(!sim.is_on(OutputRole::Heater));
    assert_eq!(sim.level(OutputRole::Heater), Some(RelayLevel::High));
}

#[test]
fn cycle_turns_heater_off_without_tank_reading() {
    let (mut runner, sim) =
        sim_runner("[heater]\nlockout_s = 3600.0\n[sensors.health]\nstale_threshold_s = 0.0");
    pin(&sim, 20.0, 40.0);
    runner.run_cycle(&AtomicBool::new(false)).unwrap();
    runner
        .handle_command(Command::Heater(true), Instant::now())
        .unwrap();

    sim.disconnect(TANK);
    let report = runner.run_cycle(&AtomicBool::new(false)).unwrap();
    assert!(!report.heater_on);
    assert!(!runner.snapshot().heater_on);
}

#[test]
fn heater_commands_are_gated() {
    let (mut runner, sim) = sim_runner("");
    pin(&sim, 20.0, 85.0);
    runner.run_cycle(&AtomicBool::new(false)).unwrap();

    assert!(matches!(
        runner.handle_command(Command::Heater(true), Instant::now()),
        Err(CommandError::Heater(HeaterError::TempLimitExceeded { .. }))
    ));

    pin(&sim, 20.0, 40.0);
    runner.run_cycle(&AtomicBool::new(false)).unwrap();
    let t0 = Instant::now();
    runner.handle_command(Command::Heater(true), t0).unwrap();
    assert!(matches!(
        runner.handle_command(Command::Heater(false), t0 + Duration::from_secs(1)),
        Err(CommandError::Heater(HeaterError::Lockout(_)))
    ));
    assert!(sim.is_on(OutputRole::Heater));
    assert_eq!(runner.stats().rejected_commands, 2);
}
