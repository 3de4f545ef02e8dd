//! TOML configuration loader with validation.
//!
//! Parses a `SolarConfig`, runs its section checks and builds the
//! calibration table, so everything the runtime needs is known good before
//! the first cycle.

use std::path::Path;

use solar_common::config::{ConfigError, ConfigLoader};
use solar_common::control_unit::config::SolarConfig;
use tracing::{debug, info};

use crate::calibration::CalibrationTable;

/// Complete validated configuration bundle, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SolarConfig,
    pub calibration: CalibrationTable,
}

impl LoadedConfig {
    /// Validate an already parsed config.
    pub fn from_config(config: SolarConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let calibration = CalibrationTable::from_config(&config.calibration)?;
        let (lo, hi) = calibration.raw_range();
        debug!(raw_min = lo, raw_max = hi, "calibration table ready");
        Ok(Self {
            config,
            calibration,
        })
    }
}

/// Load and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let config = SolarConfig::load(path).map_err(|e| match e {
        ConfigError::ParseError(msg) => {
            ConfigError::ParseError(format!("{}: {msg}", path.display()))
        }
        other => other,
    })?;
    let loaded = LoadedConfig::from_config(config)?;
    info!(
        path = %path.display(),
        service = %loaded.config.shared.service_name,
        driver = %loaded.config.driver.name,
        sensors = loaded.config.sensors.all_ids().len(),
        "configuration loaded"
    );
    Ok(loaded)
}

/// Load and validate an in-memory TOML document.
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    LoadedConfig::from_config(SolarConfig::from_toml_str(content)?)
}

// ─── Tests ──────────────────────────────────────────────────────────
