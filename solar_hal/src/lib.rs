//! # Solar HAL Library
//!
//! Hardware access for the solar loop controller. Drivers implement the
//! `HalDriver` trait defined in `solar_common::hal::driver`; the control unit
//! only ever talks to a `Box<dyn HalDriver>`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - HAL driver implementations
//! - [`output`] - Logical pump/heater state → relay levels
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         solar_hal                             │
//! │  ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐  │
//! │  │  OutputBank  │───►│  HalDriver   │◄───│ DriverRegistry  │  │
//! │  │  (NC / NO)   │    │ (trait obj)  │    │                 │  │
//! │  └──────────────┘    └──────┬───────┘    └─────────────────┘  │
//! │                             │                                 │
//! │                             ▼                                 │
//! │              ADC boards / relay board / simulation            │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod driver_registry;
pub mod drivers;
pub mod output;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::register_builtin_drivers;
pub use crate::output::OutputBank;
