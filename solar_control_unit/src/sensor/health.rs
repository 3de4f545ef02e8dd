//! Per-sensor health state machine.
//!
//! Each `record_reading` call classifies one outcome:
//!
//! | value   | last good           | result                     |
//! |---------|---------------------|----------------------------|
//! | present | any                 | `(value, Healthy)`         |
//! | absent  | none                | `(None, Failed)`           |
//! | absent  | younger than window | `(last_good, Degraded)`    |
//! | absent  | window elapsed      | `(None, Failed)`           |
//!
//! The window is `stale_threshold`: a sensor with its last good read at
//! `t0` is Degraded for `t < t0 + stale_threshold` and Failed from then on.
//! The cached value is kept after it stops being surfaced.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use solar_common::control_unit::sensor::{HealthSummary, SensorSample, SensorStatus};
use solar_common::hal::types::SensorId;
use tracing::{info, warn};

/// Last successfully read value and when it was read.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LastGood {
    value: f64,
    at: Instant,
}

/// Health bookkeeping for one sensor. Created on first read, never dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorHealthRecord {
    last_good: Option<LastGood>,
    consecutive_failures: u32,
    last_status: SensorStatus,
}

impl SensorHealthRecord {
    const fn new() -> Self {
        Self {
            last_good: None,
            consecutive_failures: 0,
            last_status: SensorStatus::Failed,
        }
    }

    #[inline]
    pub fn last_good_value(&self) -> Option<f64> {
        self.last_good.map(|g| g.value)
    }

    #[inline]
    pub fn last_good_timestamp(&self) -> Option<Instant> {
        self.last_good.map(|g| g.at)
    }

    #[inline]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Classification from the most recent reading.
    #[inline]
    pub const fn last_status(&self) -> SensorStatus {
        self.last_status
    }
}

/// Owns every sensor's health record.
#[derive(Debug, Clone)]
pub struct SensorHealthMonitor {
    records: HashMap<SensorId, SensorHealthRecord>,
    stale_threshold: Duration,
}

impl SensorHealthMonitor {
    pub fn new(stale_threshold: Duration) -> Self {
        Self {
            records: HashMap::new(),
            stale_threshold,
        }
    }

    #[inline]
    pub fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    /// Classify a reading taken now.
    pub fn record_reading(&mut self, sensor: SensorId, value: Option<f64>) -> SensorSample {
        self.record_reading_at(sensor, value, Instant::now())
    }

    /// Classify a reading taken at `now`.
    pub fn record_reading_at(
        &mut self,
        sensor: SensorId,
        value: Option<f64>,
        now: Instant,
    ) -> SensorSample {
        let stale_threshold = self.stale_threshold;
        let record = self
            .records
            .entry(sensor)
            .or_insert_with(SensorHealthRecord::new);
        let previous = record.last_status;

        let sample = match (value, record.last_good) {
            (Some(v), _) => {
                record.last_good = Some(LastGood { value: v, at: now });
                record.consecutive_failures = 0;
                SensorSample {
                    sensor_id: sensor,
                    value: Some(v),
                    status: SensorStatus::Healthy,
                    age_seconds: 0.0,
                }
            }
            (None, None) => {
                record.consecutive_failures = record.consecutive_failures.saturating_add(1);
                SensorSample {
                    sensor_id: sensor,
                    value: None,
                    status: SensorStatus::Failed,
                    age_seconds: f64::INFINITY,
                }
            }
            (None, Some(good)) => {
                record.consecutive_failures = record.consecutive_failures.saturating_add(1);
                let age = now.saturating_duration_since(good.at);
                let fresh_enough = age < stale_threshold;
                SensorSample {
                    sensor_id: sensor,
                    value: fresh_enough.then_some(good.value),
                    status: if fresh_enough {
                        SensorStatus::Degraded
                    } else {
                        SensorStatus::Failed
                    },
                    age_seconds: age.as_secs_f64(),
                }
            }
        };
        record.last_status = sample.status;

        if sample.status != previous {
            match sample.status {
                SensorStatus::Healthy => info!(%sensor, "sensor healthy"),
                SensorStatus::Degraded => warn!(
                    %sensor,
                    age_s = sample.age_seconds,
                    "sensor degraded, using last known good value"
                ),
                SensorStatus::Failed => warn!(
                    %sensor,
                    failures = record.consecutive_failures,
                    "sensor failed"
                ),
            }
        }
        sample
    }

    /// Record of one sensor, if it has ever been read.
    pub fn record(&self, sensor: SensorId) -> Option<&SensorHealthRecord> {
        self.records.get(&sensor)
    }

    /// Counts per status and the sorted ids of degraded and failed sensors.
    pub fn sensor_health_summary(&self) -> HealthSummary {
        let mut summary = HealthSummary::default();
        for (&id, record) in &self.records {
            match record.last_status {
                SensorStatus::Healthy => summary.healthy += 1,
                SensorStatus::Degraded => {
                    summary.degraded += 1;
                    summary.degraded_sensors.push(id);
                }
                SensorStatus::Failed => {
                    summary.failed += 1;
                    summary.failed_sensors.push(id);
                }
            }
        }
        summary.degraded_sensors.sort_unstable();
        summary.failed_sensors.sort_unstable();
        summary
    }

    /// True once `consecutive_failures >= threshold`. Unknown sensors never alert.
    pub fn should_alert(&self, sensor: SensorId, threshold: u32) -> bool {
        self.records
            .get(&sensor)
            .is_some_and(|r| r.consecutive_failures >= threshold)
    }
}

impl Default for SensorHealthMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(
            solar_common::consts::STALE_THRESHOLD_S_DEFAULT,
        ))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
