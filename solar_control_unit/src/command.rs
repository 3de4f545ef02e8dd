//! Inbound command decoding.
//!
//! Commands arrive as `(topic, payload)` pairs. Only the trailing topic
//! segments are significant, so any bus prefix is accepted:
//!
//! | topic suffix              | payload              | command              |
//! |---------------------------|----------------------|----------------------|
//! | `manual`                  | `{"state": 0\|1}`    | `ManualMode`         |
//! | `pump`                    | `{"state": 0\|1}`    | `ManualPump`         |
//! | `heater`                  | `ON` / `OFF`         | `Heater`             |
//! | `thresholds/<field>`      | `{"state": <float>}` | `Threshold`          |

use serde::Deserialize;
use serde_json::Value;
use solar_common::config::ConfigError;
use solar_common::control_unit::config::ThresholdField;
use solar_common::control_unit::error::HeaterError;
use thiserror::Error;

/// Decoded inbound command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Enter (`true`) or leave manual pump control.
    ManualMode(bool),
    /// Desired pump state while in manual mode.
    ManualPump(bool),
    /// Auxiliary heater switch request.
    Heater(bool),
    /// Replace one control threshold.
    Threshold(ThresholdField, f64),
}

/// Decoding or application failure of a command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command topic '{0}'")]
    UnknownTopic(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid state value: {0}")]
    InvalidState(String),

    #[error("pump command ignored, manual mode is off")]
    NotInManualMode,

    #[error("heater command rejected, tank temperature unavailable")]
    TankUnavailable,

    #[error("heater command rejected: {0}")]
    Heater(#[from] HeaterError),

    #[error("threshold update rejected: {0}")]
    Threshold(#[from] ConfigError),
}

#[derive(Deserialize)]
struct StatePayload {
    state: Value,
}

fn state_value(payload: &str) -> Result<Value, CommandError> {
    serde_json::from_str::<StatePayload>(payload.trim())
        .map(|p| p.state)
        .map_err(|e| CommandError::InvalidPayload(e.to_string()))
}

fn switch_state(payload: &str) -> Result<bool, CommandError> {
    match state_value(payload)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) if n.as_u64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_u64() == Some(1) => Ok(true),
        other => Err(CommandError::InvalidState(format!(
            "expected 0 or 1, got {other}"
        ))),
    }
}

fn numeric_state(payload: &str) -> Result<f64, CommandError> {
    let value = match state_value(payload)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidState(format!("expected a number in '{payload}'")))
}

fn on_off(payload: &str) -> Result<bool, CommandError> {
    match payload.trim() {
        p if p.eq_ignore_ascii_case("ON") => Ok(true),
        p if p.eq_ignore_ascii_case("OFF") => Ok(false),
        other => Err(CommandError::InvalidPayload(format!(
            "expected ON or OFF, got '{other}'"
        ))),
    }
}

impl Command {
    /// Decode a command from its topic and payload.
    pub fn decode(topic: &str, payload: &str) -> Result<Self, CommandError> {
        let mut segments = topic.trim_end_matches('/').rsplit('/');
        let last = segments.next().unwrap_or_default();
        let parent = segments.next();

        if parent == Some("thresholds") {
            let field = ThresholdField::from_key(last)
                .ok_or_else(|| CommandError::UnknownTopic(topic.to_string()))?;
            return Ok(Self::Threshold(field, numeric_state(payload)?));
        }
        match last {
            "manual" => Ok(Self::ManualMode(switch_state(payload)?)),
            "pump" => Ok(Self::ManualPump(switch_state(payload)?)),
            "heater" => Ok(Self::Heater(on_off(payload)?)),
            _ => Err(CommandError::UnknownTopic(topic.to_string())),
        }
    }

    /// Parse a `"<topic> <payload>"` line. The payload may contain spaces.
    pub fn parse_line(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (topic, payload) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| CommandError::InvalidPayload(format!("missing payload in '{line}'")))?;
        Self::decode(topic, payload)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
