//! Operator interface
//!
//! The session talks to a human through [`Operator`]: it asks questions and
//! reports [`Event`]s. The binary implements it on the terminal; tests use a
//! scripted double.

use crate::arbiter::Decision;
use crate::protocol::MotorCommand;
use crate::reading::Reading;
use std::io;

/// Something the operator should see
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Menu,
    InvalidChoice(String),
    AutomaticStarted { target: String },
    DeviceConnected { device: String },
    DeviceUnavailable { target: String, reason: String },
    /// The controller could not read its sensor
    SensorError,
    /// A status echo from the controller
    DeviceStatus(String),
    MalformedLine { reason: String },
    ReadFailed { reason: String },
    Reading(Reading),
    Decision {
        decision: Decision,
        /// Display form of each classifier's label, in call order
        outputs: [String; 2],
    },
    CommandSent { command: MotorCommand, manual: bool },
    NoCommand { label: String, manual: bool },
    /// Manual mode produced a command but no device is connected
    NoDevice,
    SendFailed { reason: String },
    CycleFailed { reason: String },
    ManualStarted,
    InvalidNumber { input: String },
    AutomaticStopped,
    ConnectionClosed { device: String },
    ReturnToMenu,
}

/// Human on the other end of the session
pub trait Operator {
    /// Show `prompt` and read one line of input
    ///
    /// Returns `Ok(None)` when input is closed.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    fn notify(&mut self, event: Event);
}
