//! Safety module root.
//!
//! Heater gating: anti-cycling lockout and tank temperature ceiling.

pub mod heater;

pub use heater::HeaterGuard;
