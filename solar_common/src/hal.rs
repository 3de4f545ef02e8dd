//! Hardware-access types shared between the HAL and the control unit.
//!
//! The control unit only ever reasons in logical on/off terms; translating a
//! logical state into an electrical relay level is the HAL's job.

pub mod driver;
pub mod types;
