//! Control engine root.
//!
//! Priority-ordered hysteresis state machine deciding pump actuation and the
//! reported operating mode.

pub mod engine;

pub use engine::{ControlEngine, EngineInputs};
