//! Control unit shared types.
//!
//! Everything the control unit exposes to other crates lives here: operating
//! mode and control state, thresholds and the TOML configuration tree, sensor
//! samples and health summaries, and the error enums.

pub mod config;
pub mod error;
pub mod sensor;
pub mod state;
