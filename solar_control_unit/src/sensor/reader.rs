//! Bounded-retry sensor reads.
//!
//! A read attempt fails on a HAL error, on a raw value with no calibration
//! mapping, or on a calibrated value outside the plausible range. Failed
//! attempts are retried with exponential backoff; exhaustion degrades to
//! `None` and is never an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use solar_common::control_unit::config::{PlausibleRange, RetryConfig};
use solar_common::hal::driver::{HalDriver, HalError};
use solar_common::hal::types::SensorId;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::calibration::{CalibrationError, CalibrationTable};

/// Calibrated value (if any) and number of attempts spent.
pub type ReadResult = (Option<f64>, u32);

/// Why one attempt did not produce a usable value.
#[derive(Debug, Clone, PartialEq, Error)]
enum AttemptError {
    #[error(transparent)]
    Hardware(#[from] HalError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("implausible temperature {0:.1} °C")]
    Implausible(f64),
}

// ─── Retry Policy ───────────────────────────────────────────────────

/// Attempt budget and backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Wait after failed attempt `attempt` (1-based):
    /// `initial_backoff * 2^(attempt-1)`, capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Sum of every wait a fully failing read incurs.
    pub fn worst_case_delay(&self) -> Duration {
        (1..self.max_retries.max(1)).map(|a| self.backoff_for(a)).sum()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

// ─── Reader ─────────────────────────────────────────────────────────

/// Reads and calibrates sensors through an injected `HalDriver`.
#[derive(Debug, Clone)]
pub struct SensorReader {
    table: CalibrationTable,
    plausible: PlausibleRange,
    policy: RetryPolicy,
}

impl SensorReader {
    pub fn new(table: CalibrationTable, plausible: PlausibleRange, policy: RetryPolicy) -> Self {
        Self {
            table,
            plausible,
            policy,
        }
    }

    #[inline]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[inline]
    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    fn attempt(&self, driver: &dyn HalDriver, sensor: SensorId) -> Result<f64, AttemptError> {
        let raw = driver.read_sensor(sensor)?;
        let temp = self.table.lookup(raw)?;
        if !self.plausible.contains(temp) {
            return Err(AttemptError::Implausible(temp));
        }
        Ok(temp)
    }

    /// Read one sensor, retrying per the configured policy. The attempt
    /// count and initial backoff come from [`RetryPolicy`]; see
    /// [`read_with_retry_using`](Self::read_with_retry_using) to pass them
    /// per call.
    pub fn read_with_retry(&self, driver: &dyn HalDriver, sensor: SensorId) -> ReadResult {
        self.read_cancellable(driver, sensor, &AtomicBool::new(false))
    }

    /// Read one sensor with an explicit attempt budget and initial backoff.
    /// The backoff cap stays the configured one.
    pub fn read_with_retry_using(
        &self,
        driver: &dyn HalDriver,
        sensor: SensorId,
        max_retries: u32,
        initial_backoff: Duration,
    ) -> ReadResult {
        let reader = Self {
            policy: RetryPolicy {
                max_retries,
                initial_backoff,
                max_backoff: self.policy.max_backoff,
            },
            ..self.clone()
        };
        reader.read_with_retry(driver, sensor)
    }

    /// As [`read_with_retry`](Self::read_with_retry), but gives up before the
    /// next attempt once `cancel` is set.
    pub fn read_cancellable(
        &self,
        driver: &dyn HalDriver,
        sensor: SensorId,
        cancel: &AtomicBool,
    ) -> ReadResult {
        let max = self.policy.max_retries.max(1);
        let mut attempt = 0;
        while attempt < max {
            if attempt > 0 && cancel.load(Ordering::Relaxed) {
                debug!(%sensor, attempt, "read abandoned");
                return (None, attempt);
            }
            attempt += 1;
            match self.attempt(driver, sensor) {
                Ok(temp) => {
                    if attempt > 1 {
                        debug!(%sensor, attempt, temp, "read recovered after retry");
                    }
                    return (Some(temp), attempt);
                }
                Err(e) if attempt < max => {
                    let wait = self.policy.backoff_for(attempt);
                    debug!(%sensor, attempt, error = %e, ?wait, "read failed, retrying");
                    if !wait.is_zero() {
                        std::thread::sleep(wait);
                    }
                }
                Err(e) => {
                    warn!(%sensor, attempts = attempt, error = %e, "read failed, retries exhausted");
                }
            }
        }
        (None, attempt)
    }

    /// Read every sensor in `sensors` concurrently, one scoped thread each.
    ///
    /// A failing sensor never affects the others; each id appears in the
    /// result exactly once.
    pub fn read_all(
        &self,
        driver: &dyn HalDriver,
        sensors: &[SensorId],
        cancel: &AtomicBool,
    ) -> HashMap<SensorId, ReadResult> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = sensors
                .iter()
                .map(|&id| {
                    (
                        id,
                        scope.spawn(move || self.read_cancellable(driver, id, cancel)),
                    )
                })
                .collect();

            handles
                .into_iter()
                .map(|(id, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        error!(sensor = %id, "sensor read thread panicked");
                        (None, 0)
                    });
                    (id, result)
                })
                .collect()
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use solar_common::control_unit::config::SolarConfig;
    use solar_common::hal::types::{OutputRole, RelayLevel};
    use std::sync::Mutex;

    /// Scripted driver: each sensor pops raw values from its queue; an empty
    /// queue fails.
    #[derive(Default)]
    struct ScriptedDriver {
        script: Mutex<HashMap<SensorId, Vec<Result<f64, ()>>>>,
        calls: Mutex<HashMap<SensorId, u32>>,
    }

    impl ScriptedDriver {
        fn with(sensor: SensorId, mut seq: Vec<Result<f64, ()>>) -> Self {
            seq.reverse();
            let d = Self::default();
            d.script.lock().unwrap().insert(sensor, seq);
            d
        }

        fn calls(&self, sensor: SensorId) -> u32 {
            self.calls.lock().unwrap().get(&sensor).copied().unwrap_or(0)
        }
    }

    impl HalDriver for ScriptedDriver {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn version(&self) -> &'static str {
            "0"
        }
        fn init(&mut self, _: &SolarConfig) -> Result<(), HalError> {
            Ok(())
        }
        fn read_sensor(&self, sensor: SensorId) -> Result<f64, HalError> {
            *self.calls.lock().unwrap().entry(sensor).or_default() += 1;
            match self.script.lock().unwrap().get_mut(&sensor).and_then(Vec::pop) {
                Some(Ok(raw)) => Ok(raw),
                _ => Err(HalError::ReadFailed {
                    sensor,
                    reason: "scripted".to_string(),
                }),
            }
        }
        fn write_output(&mut self, _: OutputRole, _: u8, _: RelayLevel) -> Result<(), HalError> {
            Ok(())
        }
        fn shutdown(&mut self) -> Result<(), HalError> {
            Ok(())
        }
    }

    const S: SensorId = SensorId::new(0, 1);

    fn reader(max_retries: u32) -> SensorReader {
        SensorReader::new(
            CalibrationTable::default(),
            PlausibleRange::default(),
            RetryPolicy {
                max_retries,
                ..RetryPolicy::no_retry()
            },
        )
    }

    #[test]
    fn success_on_first_attempt() {
        let driver = ScriptedDriver::with(S, vec![Ok(1.0)]);
        assert_eq!(reader(3).read_with_retry(&driver, S), (Some(0.0), 1));
        assert_eq!(driver.calls(S), 1);
    }

    #[test]
    fn recovers_after_transient_failure() {
        let driver = ScriptedDriver::with(S, vec![Err(()), Ok(1.1)]);
        assert_eq!(reader(3).read_with_retry(&driver, S), (Some(25.8), 2));
    }

    #[test]
    fn exhaustion_returns_none_with_budget_spent() {
        let driver = ScriptedDriver::default();
        assert_eq!(reader(4).read_with_retry(&driver, S), (None, 4));
        assert_eq!(driver.calls(S), 4);
    }

    #[test]
    fn sentinel_and_out_of_table_count_as_failures() {
        let driver = ScriptedDriver::with(S, vec![Ok(60.0), Ok(0.2), Ok(1.0)]);
        assert_eq!(reader(3).read_with_retry(&driver, S), (Some(0.0), 3));
    }

    #[test]
    fn implausible_value_counts_as_failure() {
        // 1.9 kΩ calibrates to ~238 °C, above the plausible ceiling
        let driver = ScriptedDriver::with(S, vec![Ok(1.9), Ok(1.9)]);
        assert_eq!(reader(2).read_with_retry(&driver, S), (None, 2));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 6,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(64), Duration::from_millis(500));
        assert_eq!(policy.worst_case_delay(), Duration::from_millis(1700));
    }

    #[test]
    fn failed_attempts_wait_out_the_backoff() {
        let driver = ScriptedDriver::default();
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
        };
        let r = SensorReader::new(CalibrationTable::default(), PlausibleRange::default(), policy);

        let started = std::time::Instant::now();
        assert_eq!(r.read_with_retry(&driver, S), (None, 3));
        // 50 ms after the first failure, 100 ms after the second
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert_eq!(driver.calls(S), 3);
    }

    #[test]
    fn per_call_budget_overrides_policy() {
        let driver = ScriptedDriver::default();
        let started = std::time::Instant::now();
        let result = reader(5).read_with_retry_using(&driver, S, 2, Duration::from_millis(20));
        assert_eq!(result, (None, 2));
        assert_eq!(driver.calls(S), 2);
        // no_retry() caps the backoff at zero
        assert!(started.elapsed() < Duration::from_secs(1));

        let driver = ScriptedDriver::with(S, vec![Err(()), Ok(1.0)]);
        assert_eq!(
            reader(1).read_with_retry_using(&driver, S, 3, Duration::ZERO),
            (Some(0.0), 2)
        );
    }

    #[test]
    fn cancelled_read_stops_retrying() {
        let driver = ScriptedDriver::default();
        let cancel = AtomicBool::new(true);
        assert_eq!(reader(5).read_cancellable(&driver, S, &cancel), (None, 1));
    }

    #[test]
    fn bulk_read_isolates_failures() {
        let good = SensorId::new(0, 2);
        let driver = ScriptedDriver::with(good, vec![Ok(1.0)]);
        let ids = [S, good];
        let results = reader(2).read_all(&driver, &ids, &AtomicBool::new(false));
        assert_eq!(results.len(), 2);
        assert_eq!(results[&S], (None, 2));
        assert_eq!(results[&good], (Some(0.0), 1));
    }
}
