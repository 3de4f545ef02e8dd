//! Simulation driver module.
//!
//! Software stand-in for the ADC and relay boards: a lumped thermal model of
//! collector and tank, PT1000 raw values, and fault injection for tests.

mod driver;
mod thermal;

pub use driver::{SimulationDriver, SimulationHandle};
pub use thermal::{ThermalModel, pt1000_resistance};

use solar_common::hal::driver::HalDriver;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn HalDriver> {
    Box::new(SimulationDriver::new())
}
