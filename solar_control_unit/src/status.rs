//! Outbound status document and publishers.

use std::io::Write;

use serde::Serialize;
use solar_common::control_unit::sensor::HealthSummary;
use solar_common::control_unit::state::Mode;
use thiserror::Error;

/// One status document per published cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDocument {
    pub mode: Mode,
    pub pump_on: bool,
    pub overheated: bool,
    pub collector_cooling_active: bool,
    /// Collector minus tank, absent when either is unusable.
    #[serde(rename = "dT")]
    pub dt: Option<f64>,
    pub heater_on: bool,
    pub collector_temp: Option<f64>,
    pub tank_temp: Option<f64>,
    pub sensor_health_summary: HealthSummary,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("status encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("status write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink for status documents.
pub trait StatusPublisher {
    fn publish(&mut self, status: &StatusDocument) -> Result<(), PublishError>;
}

/// Writes each document as one line of JSON.
pub struct JsonLinePublisher<W: Write> {
    out: W,
}

impl<W: Write> JsonLinePublisher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusPublisher for JsonLinePublisher<W> {
    fn publish(&mut self, status: &StatusDocument) -> Result<(), PublishError> {
        serde_json::to_writer(&mut self.out, status)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
