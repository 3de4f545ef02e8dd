//! Integration test: rule precedence and hysteresis of the control engine.

use proptest::prelude::*;
use solar_common::control_unit::config::ControlThresholds;
use solar_common::control_unit::state::Mode;
use solar_control_unit::control::{ControlEngine, EngineInputs};

// ── Helpers ─────────────────────────────────────────────────────────

fn reference() -> ControlThresholds {
    ControlThresholds {
        tank_target: 70.0,
        tank_hysteresis: 0.0,
        start_dt: 8.0,
        stop_dt: 4.0,
        cooling_temp: 90.0,
        cooling_hysteresis: 4.0,
        boiling_temp: 150.0,
        boiling_hysteresis: 10.0,
    }
}

fn temps(collector: f64, tank: f64) -> EngineInputs {
    EngineInputs {
        collector_temp: Some(collector),
        tank_temp: Some(tank),
        manual_override: None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn overheat_beats_large_delta() {
    let mut engine = ControlEngine::new();
    let st = engine.evaluate(temps(155.0, 30.0), &reference()).unwrap();
    assert_eq!(st.mode, Mode::Overheated);
    assert!(!st.pump_on);
}

#[test]
fn dead_band_sequence() {
    let mut engine = ControlEngine::new();
    let th = reference();
    let tank = 40.0;
    let expected = [
        (5.0, false),
        (8.0, true),
        (7.0, true),
        (6.0, true),
        (5.0, true),
        (4.0, false),
    ];
    for (dt, pump_on) in expected {
        let st = engine.evaluate(temps(tank + dt, tank), &th).unwrap();
        assert_eq!(st.pump_on, pump_on, "dT = {dt}");
    }
}

#[test]
fn reverse_flow_without_manual() {
    let mut engine = ControlEngine::new();
    let st = engine.evaluate(temps(20.0, 30.0), &reference()).unwrap();
    assert!(!st.pump_on);
    assert!(!st.manual_control);
}

#[test]
fn cooling_overrides_full_tank() {
    let mut engine = ControlEngine::new();
    let st = engine.evaluate(temps(95.0, 75.0), &reference()).unwrap();
    assert_eq!(st.mode, Mode::CollectorCooling);
    assert!(st.pump_on);
}

#[test]
fn overheat_then_cooling_then_normal() {
    let mut engine = ControlEngine::new();
    let th = reference();
    let trace: Vec<Mode> = [152.0, 145.0, 139.0, 88.0, 85.0]
        .iter()
        .map(|&c| engine.evaluate(temps(c, 60.0), &th).unwrap().mode)
        .collect();
    assert_eq!(
        trace,
        vec![
            Mode::Overheated,
            Mode::Overheated,
            Mode::CollectorCooling,
            Mode::CollectorCooling,
            Mode::Heating,
        ]
    );
}

#[test]
fn leaving_manual_resumes_automatic_rules() {
    let mut engine = ControlEngine::new();
    let th = reference();
    let manual = EngineInputs {
        manual_override: Some(true),
        ..temps(20.0, 30.0)
    };
    assert!(engine.evaluate(manual, &th).unwrap().pump_on);
    let st = engine.evaluate(temps(20.0, 30.0), &th).unwrap();
    assert!(!st.pump_on);
    assert!(!st.manual_control);
    assert_eq!(st.mode, Mode::Standby);
}

proptest! {
    #[test]
    fn pump_never_runs_backwards(collector in -40.0f64..190.0, gap in 0.1f64..60.0, prior_on: bool) {
        let mut engine = ControlEngine::new();
        let th = reference();
        if prior_on {
            engine.evaluate(temps(60.0, 40.0), &th).unwrap();
        }
        let st = engine.evaluate(temps(collector, collector + gap), &th).unwrap();
        prop_assert!(!st.pump_on);
    }

    #[test]
    fn boiling_collector_never_pumps(collector in 150.0f64..200.0, tank in 0.0f64..150.0) {
        let mut engine = ControlEngine::new();
        let st = engine.evaluate(temps(collector, tank), &reference()).unwrap();
        prop_assert_eq!(st.mode, Mode::Overheated);
        prop_assert!(!st.pump_on);
    }

    #[test]
    fn manual_always_wins(collector in -40.0f64..200.0, tank in -40.0f64..200.0, want: bool) {
        let mut engine = ControlEngine::new();
        let inputs = EngineInputs {
            manual_override: Some(want),
            ..temps(collector, tank)
        };
        let st = engine.evaluate(inputs, &reference()).unwrap();
        prop_assert_eq!(st.pump_on, want);
        prop_assert_eq!(st.mode, Mode::Manual);
    }
}
