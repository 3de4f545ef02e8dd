//! Per-cycle sensor samples and health classification.

use crate::hal::types::SensorId;
use serde::{Deserialize, Serialize};

/// Health classification of one sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    /// Fresh reading this cycle.
    Healthy,
    /// Read failed; last-known-good value is still within the staleness window.
    Degraded,
    /// No usable value.
    Failed,
}

/// Classified value of one sensor for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub sensor_id: SensorId,
    /// Fresh value (Healthy), cached value (Degraded) or nothing (Failed).
    pub value: Option<f64>,
    pub status: SensorStatus,
    /// Seconds since the surfaced value was read. Infinite if never read.
    pub age_seconds: f64,
}

impl SensorSample {
    /// Value the control logic may act on.
    #[inline]
    pub fn usable_value(&self) -> Option<f64> {
        match self.status {
            SensorStatus::Healthy | SensorStatus::Degraded => self.value,
            SensorStatus::Failed => None,
        }
    }
}

/// Aggregate view over all tracked sensors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub degraded: usize,
    pub failed: usize,
    pub degraded_sensors: Vec<SensorId>,
    pub failed_sensors: Vec<SensorId>,
}

impl HealthSummary {
    #[inline]
    pub fn total(&self) -> usize {
        self.healthy + self.degraded + self.failed
    }

    #[inline]
    pub fn all_healthy(&self) -> bool {
        self.degraded == 0 && self.failed == 0
    }
}
