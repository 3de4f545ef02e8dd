//! Cycle benchmark: cost of one engine evaluation, one calibration lookup
//! and one full simulated cycle (reads, health, engine, heater, outputs).

use std::hint::black_box;
use std::sync::atomic::AtomicBool;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use solar_common::control_unit::config::ControlThresholds;
use solar_control_unit::calibration::CalibrationTable;
use solar_control_unit::config::load_config_from_str;
use solar_control_unit::control::{ControlEngine, EngineInputs};
use solar_control_unit::cycle::CycleRunner;
use solar_hal::drivers::simulation::SimulationDriver;

fn bench_engine(c: &mut Criterion) {
    let thresholds = ControlThresholds::default();
    let mut engine = ControlEngine::new();
    let mut collector = 30.0;
    c.bench_function("engine_evaluate", |b| {
        b.iter(|| {
            collector = if collector > 160.0 { 30.0 } else { collector + 0.7 };
            let inputs = EngineInputs {
                collector_temp: Some(collector),
                tank_temp: Some(45.0),
                manual_override: None,
            };
            black_box(engine.evaluate(black_box(inputs), &thresholds))
        })
    });
}

fn bench_calibration(c: &mut Criterion) {
    let table = CalibrationTable::default();
    c.bench_function("calibration_lookup", |b| {
        b.iter(|| black_box(table.calibrate(black_box(1.4321))))
    });
}

/// Config with `aux` auxiliary sensors on board 1.
fn config_with_auxiliary(aux: u8) -> String {
    let entries: Vec<String> = (0..aux)
        .map(|ch| format!("{{ name = \"aux{ch}\", board = 1, channel = {} }}", ch + 1))
        .collect();
    format!("[sensors]\nauxiliary = [{}]\n", entries.join(", "))
}

fn bench_full_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_cycle");
    for aux in [0u8, 2, 6] {
        let loaded = load_config_from_str(&config_with_auxiliary(aux)).expect("bench config");
        let mut runner =
            CycleRunner::new(loaded, Box::new(SimulationDriver::new())).expect("bench runner");
        let cancel = AtomicBool::new(false);
        group.bench_with_input(BenchmarkId::new("sensors", aux + 2), &aux, |b, _| {
            b.iter(|| black_box(runner.run_cycle(&cancel)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_engine, bench_calibration, bench_full_cycle);
criterion_main!(benches);
