//! Acquisition loop
//!
//! One cycle: obtain a reading, scale it, arbitrate between the two
//! classifiers, map the label to a motor command and send it when a device
//! is attached. Every failure inside a cycle is reported to the operator and
//! the loop carries on; only a stop request ends the device feed.

use crate::arbiter::{Decision, PredictionArbiter};
use crate::device::DeviceLink;
use crate::error::{Error, ParseError};
use crate::labels::{describe, Label};
use crate::operator::{Event, Operator};
use crate::protocol::{parse_line, DeviceLine, MotorCommand};
use crate::reading::Reading;
use crate::signal::StopSignal;
use crate::training::TrainedBundle;
use tracing::{debug, info, warn};

/// Where the loop currently is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    WaitingForInput,
    Parsing,
    Inferring,
    Dispatching,
    Stopped,
}

/// Where a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Device,
    Manual,
}

/// Result of one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Timeout or blank line
    Idle,
    /// Sentinel or malformed line, or a failed inference
    Skipped,
    Decided {
        decision: Decision,
        sent: Option<MotorCommand>,
    },
}

pub struct AcquisitionLoop<'a> {
    bundle: &'a TrainedBundle,
    device: Option<Box<dyn DeviceLink>>,
    stop: StopSignal,
    state: LoopState,
}

impl<'a> AcquisitionLoop<'a> {
    pub fn new(bundle: &'a TrainedBundle, stop: StopSignal) -> Self {
        Self {
            bundle,
            device: None,
            stop,
            state: LoopState::WaitingForInput,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Take ownership of a freshly opened link, closing any previous one
    pub fn attach(&mut self, device: Box<dyn DeviceLink>, operator: &mut dyn Operator) {
        self.close_device(operator);
        info!("Attached device {}", device.name());
        self.device = Some(device);
        self.state = LoopState::WaitingForInput;
    }

    /// Drop the attached link, if any
    pub fn close_device(&mut self, operator: &mut dyn Operator) {
        if let Some(device) = self.device.take() {
            let name = device.name().to_string();
            drop(device);
            info!("Device connection {} closed", name);
            operator.notify(Event::ConnectionClosed { device: name });
        }
    }

    /// Read and classify device lines until a stop is requested
    ///
    /// The stop flag is checked before every read. On exit the device is
    /// closed and the loop is left in [`LoopState::Stopped`].
    pub fn run_device_feed(&mut self, operator: &mut dyn Operator) {
        while !self.stop.is_requested() {
            self.state = LoopState::WaitingForInput;
            let Some(device) = self.device.as_mut() else {
                warn!("Device feed started without a device");
                break;
            };

            match device.read_line() {
                Ok(Some(raw)) => {
                    self.handle_raw_line(raw, operator);
                }
                Ok(None) => {}
                Err(Error::Line(e)) => {
                    warn!("Malformed device line: {}", e);
                    operator.notify(Event::MalformedLine {
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Device read failed: {}", e);
                    operator.notify(Event::ReadFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.state = LoopState::Stopped;
        if self.stop.is_requested() {
            info!("Automatic mode stopped");
            operator.notify(Event::AutomaticStopped);
        }
        self.close_device(operator);
    }

    /// Decode and classify one raw device line
    pub fn handle_raw_line(&mut self, raw: Vec<u8>, operator: &mut dyn Operator) -> CycleOutcome {
        self.state = LoopState::Parsing;
        let parsed = String::from_utf8(raw)
            .map_err(|_| ParseError::Encoding)
            .and_then(|text| parse_line(&text));

        let outcome = match parsed {
            Ok(DeviceLine::Empty) => CycleOutcome::Idle,
            Ok(DeviceLine::SensorError) => {
                warn!("Controller reported a sensor failure");
                operator.notify(Event::SensorError);
                CycleOutcome::Skipped
            }
            Ok(DeviceLine::Status(line)) => {
                debug!("Controller status: {}", line);
                operator.notify(Event::DeviceStatus(line));
                CycleOutcome::Skipped
            }
            Ok(DeviceLine::Data(reading)) => self.process(reading, Source::Device, operator),
            Err(e) => {
                warn!("Malformed device line: {}", e);
                operator.notify(Event::MalformedLine {
                    reason: e.to_string(),
                });
                CycleOutcome::Skipped
            }
        };

        self.state = LoopState::WaitingForInput;
        outcome
    }

    /// Run one cycle on an operator-entered reading
    pub fn run_manual_cycle(
        &mut self,
        reading: Reading,
        operator: &mut dyn Operator,
    ) -> CycleOutcome {
        let outcome = self.process(reading, Source::Manual, operator);
        self.state = LoopState::WaitingForInput;
        outcome
    }

    fn process(
        &mut self,
        reading: Reading,
        source: Source,
        operator: &mut dyn Operator,
    ) -> CycleOutcome {
        self.state = LoopState::Inferring;
        debug!("Classifying {:?} reading: {}", source, reading);
        operator.notify(Event::Reading(reading));

        let scaled = self.bundle.scaler.transform_reading(&reading);
        let decision = match PredictionArbiter::new(&self.bundle.classifiers).decide(&scaled) {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Inference failed: {}", e);
                operator.notify(Event::CycleFailed {
                    reason: e.to_string(),
                });
                return CycleOutcome::Skipped;
            }
        };

        let mapping = self.bundle.mapping.as_ref();
        operator.notify(Event::Decision {
            decision: decision.clone(),
            outputs: [
                describe(mapping, decision.first.label),
                describe(mapping, decision.second.label),
            ],
        });

        self.state = LoopState::Dispatching;
        let sent = self.dispatch(decision.label, source, operator);
        CycleOutcome::Decided { decision, sent }
    }

    /// Send the command for `label`; best effort, never retried
    fn dispatch(
        &mut self,
        label: Label,
        source: Source,
        operator: &mut dyn Operator,
    ) -> Option<MotorCommand> {
        let manual = source == Source::Manual;
        let Some(command) = MotorCommand::for_label(label) else {
            operator.notify(Event::NoCommand {
                label: describe(self.bundle.mapping.as_ref(), label),
                manual,
            });
            return None;
        };

        let Some(device) = self.device.as_mut() else {
            operator.notify(Event::NoDevice);
            return None;
        };

        match device.write_line(command.token()) {
            Ok(()) => {
                info!("Sent {} to {}", command, device.name());
                operator.notify(Event::CommandSent { command, manual });
                Some(command)
            }
            Err(e) => {
                warn!("Failed to send {}: {}", command, e);
                operator.notify(Event::SendFailed {
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

impl Drop for AcquisitionLoop<'_> {
    fn drop(&mut self) {
        if let Some(device) = self.device.take() {
            debug!("Releasing device {} on shutdown", device.name());
        }
    }
}
