//! Integration test: command lines through the runner.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use solar_common::control_unit::state::Mode;
use solar_common::hal::types::OutputRole;
use solar_control_unit::command::CommandError;

use super::{pin, sim_runner};

#[test]
fn manual_session() {
    let (mut runner, sim) = sim_runner("");
    pin(&sim, 20.0, 40.0);
    let now = Instant::now();

    runner.handle_line("home/solar/manual {\"state\": 1}", now).unwrap();
    runner.handle_line("home/solar/pump {\"state\": 1}", now).unwrap();
    let report = runner.run_cycle(&AtomicBool::new(false)).unwrap();
    // manual outranks the reverse-flow guard
    assert_eq!(report.state.mode, Mode::Manual);
    assert!(sim.is_on(OutputRole::Pump));

    runner.handle_line("home/solar/manual {\"state\": 0}", now).unwrap();
    let report = runner.run_cycle(&AtomicBool::new(false)).unwrap();
    assert_eq!(report.state.mode, Mode::Standby);
    assert!(!sim.is_on(OutputRole::Pump));
    assert!(!report.state.manual_control);
}

#[test]
fn threshold_update_changes_behaviour() {
    let (mut runner, sim) = sim_runner("");
    pin(&sim, 46.0, 40.0);
    let report = runner.run_cycle(&AtomicBool::new(false)).unwrap();
    assert!(!report.state.pump_on);

    runner
        .handle_line("solar/thresholds/start_dt {\"state\": 5.0}", Instant::now())
        .unwrap();
    let report = runner.run_cycle(&AtomicBool::new(false)).unwrap();
    assert!(report.state.pump_on);
}

#[test]
fn garbage_is_counted_not_fatal() {
    let (mut runner, _sim) = sim_runner("");
    let now = Instant::now();
    assert!(matches!(
        runner.handle_line("solar/valve ON", now),
        Err(CommandError::UnknownTopic(_))
    ));
    assert!(runner.handle_line("no-payload", now).is_err());
    assert!(matches!(
        runner.handle_line("solar/thresholds/boiling_temp {\"state\": 50}", now),
        Err(CommandError::Threshold(_))
    ));
    assert_eq!(runner.stats().rejected_commands, 3);
    assert_eq!(runner.thresholds().boiling_temp, 150.0);
}
