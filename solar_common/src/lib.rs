//! Solar Common Library
//!
//! Shared constants, configuration loading and data types for all crates of
//! the solar-thermal loop controller workspace.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading trait, shared config and errors
//! - [`consts`] - Workspace-wide defaults and bounds
//! - [`control_unit`] - Control state, thresholds, sensor and heater types
//! - [`hal`] - Hardware-access trait, sensor ids, output roles and relay wiring
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use solar_common::prelude::*;
//!
//! let thresholds = ControlThresholds::default();
//! assert!(thresholds.validate().is_ok());
//! ```

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod hal;
pub mod prelude;
