//! Device line protocol
//!
//! The controller prints one record per line. Data records are three
//! comma-separated numbers in the order moisture, temperature, humidity.
//! It also prints a sensor failure marker and echoes its own status; both
//! are shown to the operator but never classified.
//!
//! Commands travel the other way as a single token per line; the device
//! link adds the newline.

use crate::error::ParseError;
use crate::labels::Label;
use crate::reading::{Reading, FEATURE_COUNT};
use std::fmt;

/// Printed by the controller when the air sensor cannot be read
pub const SENSOR_ERROR_MARKER: &str = "SENSOR_ERROR";

/// Substrings identifying the controller's status echoes
pub const STATUS_MARKERS: [&str; 2] = ["Received command:", "--> Motor is"];

/// One classified line from the device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceLine {
    /// Nothing but whitespace
    Empty,
    SensorError,
    Status(String),
    Data(Reading),
}

/// Classify a raw line from the device
///
/// Surrounding whitespace (including a trailing `\r`) is ignored.
pub fn parse_line(raw: &str) -> Result<DeviceLine, ParseError> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(DeviceLine::Empty);
    }
    if line == SENSOR_ERROR_MARKER {
        return Ok(DeviceLine::SensorError);
    }
    if STATUS_MARKERS.iter().any(|marker| line.contains(marker)) {
        return Ok(DeviceLine::Status(line.to_string()));
    }
    parse_reading(line).map(DeviceLine::Data)
}

/// Parse `moisture,temperature,humidity`
pub fn parse_reading(line: &str) -> Result<Reading, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FEATURE_COUNT {
        return Err(ParseError::FieldCount {
            expected: FEATURE_COUNT,
            found: fields.len(),
            line: line.to_string(),
        });
    }

    let mut values = [0.0; FEATURE_COUNT];
    for (index, field) in fields.iter().enumerate() {
        values[index] = parse_value(field).ok_or_else(|| ParseError::NotNumeric {
            index,
            value: field.trim().to_string(),
            line: line.to_string(),
        })?;
    }

    Ok(Reading::new(values[0], values[1], values[2]))
}

/// Parse one finite number; `NaN` and infinities are rejected
pub fn parse_value(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pump command sent back to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    On,
    Off,
}

impl MotorCommand {
    /// `1` runs the pump, `0` stops it, anything else sends nothing
    pub fn for_label(label: Label) -> Option<Self> {
        match label {
            Label::ON => Some(MotorCommand::On),
            Label::OFF => Some(MotorCommand::Off),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            MotorCommand::On => "MOTOR_ON",
            MotorCommand::Off => "MOTOR_OFF",
        }
    }
}

impl fmt::Display for MotorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
