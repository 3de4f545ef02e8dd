//! Hardware-facing value types.
//!
//! - `SensorId` - board/channel address of a temperature input
//! - `OutputRole` - functional name of a switched output
//! - `RelayWiring` / `RelayLevel` - logical → electrical translation
//! - `Actuation` - one cycle's logical output decision

use core::fmt;
use serde::{Deserialize, Serialize};

/// Opaque address of a temperature input: acquisition board + channel.
///
/// Stable for the process lifetime and used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorId {
    /// Stack position of the acquisition board.
    pub board: u8,
    /// Input channel on that board (1-based on the reference hardware).
    pub channel: u8,
}

impl SensorId {
    #[inline]
    pub const fn new(board: u8, channel: u8) -> Self {
        Self { board, channel }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.board, self.channel)
    }
}

/// Functional role of a switched output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputRole {
    /// Collector loop circulation pump.
    Pump,
    /// Auxiliary tank heater.
    Heater,
}

impl OutputRole {
    pub const ALL: [OutputRole; 2] = [OutputRole::Pump, OutputRole::Heater];
}

impl fmt::Display for OutputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pump => write!(f, "pump"),
            Self::Heater => write!(f, "heater"),
        }
    }
}

/// How a relay is wired.
///
/// Normally-closed relays conduct with no drive signal, so the electrical
/// level is the inverse of the logical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelayWiring {
    /// Normally Closed: level 0 = ON, level 1 = OFF.
    #[default]
    #[serde(rename = "NC")]
    NormallyClosed,
    /// Normally Open: level 1 = ON, level 0 = OFF.
    #[serde(rename = "NO")]
    NormallyOpen,
}

impl RelayWiring {
    /// Electrical level that realises the given logical state.
    #[inline]
    pub const fn level_for(self, logical_on: bool) -> RelayLevel {
        let high = match self {
            Self::NormallyClosed => !logical_on,
            Self::NormallyOpen => logical_on,
        };
        if high { RelayLevel::High } else { RelayLevel::Low }
    }

    /// Logical state represented by an electrical level.
    #[inline]
    pub const fn logical_for(self, level: RelayLevel) -> bool {
        let high = matches!(level, RelayLevel::High);
        match self {
            Self::NormallyClosed => !high,
            Self::NormallyOpen => high,
        }
    }
}

/// Electrical output level written to the relay board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RelayLevel {
    Low = 0,
    High = 1,
}

impl RelayLevel {
    #[inline]
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

/// Physical binding of an output role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBinding {
    /// Relay number on the output board.
    pub pin: u8,
    /// Relay wiring (default NC, as in the reference installation).
    #[serde(default)]
    pub wiring: RelayWiring,
}

/// Logical actuation decided in one control cycle.
///
/// Emitted once per cycle, after rule evaluation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actuation {
    pub pump_on: bool,
    pub heater_on: bool,
}

impl Actuation {
    /// Logical state requested for a role.
    #[inline]
    pub const fn state_of(&self, role: OutputRole) -> bool {
        match role {
            OutputRole::Pump => self.pump_on,
            OutputRole::Heater => self.heater_on,
        }
    }
}
