//! Auxiliary heater guard.
//!
//! Checks run in a fixed order and a rejected request never changes state:
//!
//! 1. switching on with the tank at or above the limit → `TempLimitExceeded`
//! 2. last accepted command less than `lockout` ago → `Lockout(remaining)`
//! 3. already in the requested state → success, nothing recorded
//! 4. otherwise flip and stamp the command time
//!
//! The caller drives the relay after a successful request.

use std::time::{Duration, Instant};

use solar_common::consts::HEATER_LOCKOUT_S_DEFAULT;
use solar_common::control_unit::error::HeaterError;
use solar_common::control_unit::state::HeaterState;
use tracing::{info, warn};

/// Sole owner of [`HeaterState`].
#[derive(Debug, Clone)]
pub struct HeaterGuard {
    state: HeaterState,
    lockout: Duration,
}

impl HeaterGuard {
    pub fn new(lockout: Duration) -> Self {
        Self {
            state: HeaterState::default(),
            lockout,
        }
    }

    #[inline]
    pub fn state(&self) -> HeaterState {
        self.state
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.state.heater_on
    }

    #[inline]
    pub fn lockout(&self) -> Duration {
        self.lockout
    }

    /// Ask to switch the heater.
    ///
    /// A non-finite `tank_temp` counts as above the limit.
    pub fn request(
        &mut self,
        turn_on: bool,
        tank_temp: f64,
        temp_limit: f64,
        now: Instant,
    ) -> Result<(), HeaterError> {
        if turn_on && !(tank_temp < temp_limit) {
            return Err(HeaterError::TempLimitExceeded {
                tank_temp,
                temp_limit,
            });
        }
        if let Some(last) = self.state.last_command_time {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.lockout {
                return Err(HeaterError::Lockout((self.lockout - elapsed).as_secs_f64()));
            }
        }
        if turn_on == self.state.heater_on {
            return Ok(());
        }
        self.state.heater_on = turn_on;
        self.state.last_command_time = Some(now);
        info!(heater_on = turn_on, tank_temp, "heater switched");
        Ok(())
    }

    /// Switch off regardless of lockout. Returns whether anything changed.
    pub fn force_off(&mut self, now: Instant) -> bool {
        if !self.state.heater_on {
            return false;
        }
        self.state.heater_on = false;
        self.state.last_command_time = Some(now);
        warn!("heater forced off");
        true
    }
}

impl Default for HeaterGuard {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(HEATER_LOCKOUT_S_DEFAULT))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
