//! Calibration table properties over the whole range.

use proptest::prelude::*;
use solar_control_unit::calibration::CalibrationTable;
use solar_hal::drivers::simulation::pt1000_resistance;

proptest! {
    #[test]
    fn calibration_is_monotonic(a in 0.8031f64..1.9409, b in 0.8031f64..1.9409) {
        let table = CalibrationTable::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let t_lo = table.calibrate(lo).unwrap();
        let t_hi = table.calibrate(hi).unwrap();
        prop_assert!(t_lo <= t_hi, "calibrate({lo}) = {t_lo} > calibrate({hi}) = {t_hi}");
    }

    #[test]
    fn pt1000_round_trip_within_half_kelvin(temp in -49.0f64..199.0) {
        let table = CalibrationTable::default();
        let raw = pt1000_resistance(temp) / 1000.0;
        let back = table.calibrate(raw).unwrap();
        prop_assert!((back - temp).abs() < 0.5, "{temp} -> {raw} -> {back}");
    }

    #[test]
    fn outside_table_never_maps(raw in prop_oneof![0.0f64..0.803, 1.941f64..59.0]) {
        prop_assert_eq!(CalibrationTable::default().calibrate(raw), None);
    }
}

#[test]
fn result_has_one_decimal() {
    let table = CalibrationTable::default();
    let mut raw = 0.81;
    while raw < 1.94 {
        let t = table.calibrate(raw).unwrap();
        assert!(((t * 10.0).round() - t * 10.0).abs() < 1e-9, "{raw} -> {t}");
        raw += 0.0137;
    }
}
