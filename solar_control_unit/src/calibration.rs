//! Piecewise-linear resistance → temperature conversion.
//!
//! Raw readings arrive in kΩ and are scaled to Ω before lookup. Each segment
//! covers `[lower_bound, next_lower_bound)`, the last one ends at the table's
//! `upper_bound`. Lookup is a binary search over the lower bounds.

use solar_common::config::ConfigError;
use solar_common::consts::{RAW_FAULT_SENTINEL, RAW_SCALE};
use solar_common::control_unit::config::{CalibrationConfig, CalibrationSegment};
use thiserror::Error;

/// Reason a raw value has no temperature mapping.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CalibrationError {
    /// The board reported its disconnected-channel marker.
    #[error("fault sentinel reported (sensor disconnected)")]
    FaultSentinel,
    /// Scaled value outside the table.
    #[error("raw value {0} outside calibration range")]
    OutOfRange(f64),
}

const fn seg(lower: f64, divisor: f64, base: f64) -> CalibrationSegment {
    CalibrationSegment {
        resistance_lower_bound: lower,
        slope_divisor: divisor,
        base_temperature: base,
    }
}

/// PT1000, -50 °C to 250 °C in 50 K steps.
const PT1000_SEGMENTS: [CalibrationSegment; 6] = [
    seg(803.06, 3.9388, -50.0),
    seg(1000.00, 3.8800, 0.0),
    seg(1194.00, 3.8212, 50.0),
    seg(1385.06, 3.7638, 100.0),
    seg(1573.25, 3.7062, 150.0),
    seg(1758.56, 3.6484, 200.0),
];
const PT1000_UPPER_BOUND: f64 = 1940.98;

/// Immutable calibration table, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    segments: Vec<CalibrationSegment>,
    upper_bound: f64,
    fault_sentinel: f64,
}

impl CalibrationTable {
    /// Build and validate a table.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` unless the table is non-empty, every
    /// number is finite, lower bounds strictly increase, divisors are
    /// positive and `upper_bound` lies above the last lower bound.
    pub fn new(
        segments: Vec<CalibrationSegment>,
        upper_bound: f64,
        fault_sentinel: f64,
    ) -> Result<Self, ConfigError> {
        let invalid = |msg: String| ConfigError::ValidationError(format!("calibration: {msg}"));

        let Some(last) = segments.last() else {
            return Err(invalid("table has no segments".to_string()));
        };
        if !upper_bound.is_finite() || upper_bound <= last.resistance_lower_bound {
            return Err(invalid(format!(
                "upper_bound {upper_bound} must exceed last lower bound {}",
                last.resistance_lower_bound
            )));
        }
        for (i, s) in segments.iter().enumerate() {
            if !(s.resistance_lower_bound.is_finite() && s.base_temperature.is_finite()) {
                return Err(invalid(format!("segment {i} has a non-finite value")));
            }
            if !(s.slope_divisor.is_finite() && s.slope_divisor > 0.0) {
                return Err(invalid(format!(
                    "segment {i} slope_divisor {} must be positive",
                    s.slope_divisor
                )));
            }
        }
        if let Some(i) = segments
            .windows(2)
            .position(|w| w[1].resistance_lower_bound <= w[0].resistance_lower_bound)
        {
            return Err(invalid(format!(
                "segment {} lower bound does not increase",
                i + 1
            )));
        }

        Ok(Self {
            segments,
            upper_bound,
            fault_sentinel,
        })
    }

    /// Built-in PT1000 table.
    pub fn pt1000(fault_sentinel: f64) -> Self {
        Self {
            segments: PT1000_SEGMENTS.to_vec(),
            upper_bound: PT1000_UPPER_BOUND,
            fault_sentinel,
        }
    }

    /// Table described by the `[calibration]` section.
    pub fn from_config(config: &CalibrationConfig) -> Result<Self, ConfigError> {
        match (&config.segments, config.upper_bound) {
            (None, None) => Ok(Self::pt1000(config.fault_sentinel)),
            (Some(segments), Some(upper)) => {
                Self::new(segments.clone(), upper, config.fault_sentinel)
            }
            _ => Err(ConfigError::ValidationError(
                "calibration: segments and upper_bound must be given together".to_string(),
            )),
        }
    }

    /// Raw (unscaled) interval covered by the table, upper end exclusive.
    pub fn raw_range(&self) -> (f64, f64) {
        let lower = self
            .segments
            .first()
            .map_or(self.upper_bound, |s| s.resistance_lower_bound);
        (lower / RAW_SCALE, self.upper_bound / RAW_SCALE)
    }

    /// Map a raw reading to °C, rounded to one decimal.
    pub fn lookup(&self, raw_value: f64) -> Result<f64, CalibrationError> {
        if raw_value == self.fault_sentinel {
            return Err(CalibrationError::FaultSentinel);
        }
        let scaled = raw_value * RAW_SCALE;
        let lower = self
            .segments
            .first()
            .map_or(self.upper_bound, |s| s.resistance_lower_bound);
        // NaN fails both comparisons and lands here too
        if !(scaled >= lower && scaled < self.upper_bound) {
            return Err(CalibrationError::OutOfRange(raw_value));
        }
        let idx = self
            .segments
            .partition_point(|s| s.resistance_lower_bound <= scaled)
            .saturating_sub(1);
        let s = &self.segments[idx];
        let temp = (scaled - s.resistance_lower_bound) / s.slope_divisor + s.base_temperature;
        Ok((temp * 10.0).round() / 10.0)
    }

    /// `lookup` without the reason.
    #[inline]
    pub fn calibrate(&self, raw_value: f64) -> Option<f64> {
        self.lookup(raw_value).ok()
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::pt1000(RAW_FAULT_SENTINEL)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
