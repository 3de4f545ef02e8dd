//! Output bank: applies a logical [`Actuation`] to the relay board.
//!
//! Relay wiring is resolved here and nowhere else. Everything above this
//! layer speaks in logical ON/OFF.

use solar_common::control_unit::config::OutputsConfig;
use solar_common::hal::driver::{HalDriver, HalError};
use solar_common::hal::types::{Actuation, OutputRole, RelayLevel};
use tracing::{debug, warn};

/// Relay bindings plus the last actuation that reached the hardware.
#[derive(Debug, Clone)]
pub struct OutputBank {
    bindings: OutputsConfig,
    applied: Option<Actuation>,
}

impl OutputBank {
    /// Create a bank for the configured pump/heater relays.
    pub fn new(bindings: OutputsConfig) -> Self {
        Self {
            bindings,
            applied: None,
        }
    }

    /// Last actuation written in full, `None` before the first write.
    #[inline]
    pub fn applied(&self) -> Option<Actuation> {
        self.applied
    }

    /// Electrical level the given role is driven to for `actuation`.
    #[inline]
    pub fn level_for(&self, role: OutputRole, actuation: Actuation) -> RelayLevel {
        self.bindings
            .binding(role)
            .wiring
            .level_for(actuation.state_of(role))
    }

    /// Write both outputs.
    ///
    /// Every role is attempted even if an earlier write fails; the first
    /// error is returned and `applied()` is left unchanged in that case.
    pub fn apply(
        &mut self,
        driver: &mut dyn HalDriver,
        actuation: Actuation,
    ) -> Result<(), HalError> {
        let mut first_err = None;
        for role in OutputRole::ALL {
            let pin = self.bindings.binding(role).pin;
            let level = self.level_for(role, actuation);
            if let Err(e) = driver.write_output(role, pin, level) {
                warn!(%role, pin, error = %e, "relay write failed");
                first_err.get_or_insert(e);
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }
        if self.applied != Some(actuation) {
            debug!(
                pump_on = actuation.pump_on,
                heater_on = actuation.heater_on,
                "outputs changed"
            );
        }
        self.applied = Some(actuation);
        Ok(())
    }

    /// Drive every output to logical OFF.
    pub fn all_off(&mut self, driver: &mut dyn HalDriver) -> Result<(), HalError> {
        self.apply(driver, Actuation::default())
    }
}
