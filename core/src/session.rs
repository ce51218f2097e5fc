//! Operator session
//!
//! Menu-driven driver around the acquisition loop:
//! - `1`: automatic mode, classify readings streamed by the device
//! - `2`: manual mode, classify one reading typed by the operator
//! - `q`: quit
//!
//! The device is opened when automatic mode starts and closed when it ends.

use crate::acquisition::{AcquisitionLoop, CycleOutcome};
use crate::device::DeviceConnector;
use crate::error::Result;
use crate::operator::{Event, Operator};
use crate::protocol::parse_value;
use crate::reading::Reading;
use crate::signal::StopSignal;
use crate::training::TrainedBundle;
use tracing::{info, warn};

pub const MENU_PROMPT: &str = "Enter your choice (1/2/q): ";

/// Prompts of manual mode, in reading order
pub const MANUAL_PROMPTS: [&str; 3] = [
    "Soil moisture (0-1000, e.g. 550.25): ",
    "Temperature (°C, e.g. 28.50): ",
    "Air humidity (%, e.g. 72.10): ",
];

/// Parsed menu answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Automatic,
    Manual,
    Quit,
    Invalid(String),
}

pub fn parse_menu_choice(input: &str) -> MenuChoice {
    let choice = input.trim().to_lowercase();
    match choice.as_str() {
        "1" => MenuChoice::Automatic,
        "2" => MenuChoice::Manual,
        "q" => MenuChoice::Quit,
        _ => MenuChoice::Invalid(input.trim().to_string()),
    }
}

pub struct Session<'a> {
    acquisition: AcquisitionLoop<'a>,
    connector: Box<dyn DeviceConnector>,
    stop: StopSignal,
}

impl<'a> Session<'a> {
    pub fn new(
        bundle: &'a TrainedBundle,
        connector: Box<dyn DeviceConnector>,
        stop: StopSignal,
    ) -> Self {
        Self {
            acquisition: AcquisitionLoop::new(bundle, stop.clone()),
            connector,
            stop,
        }
    }

    /// Serve the menu until the operator quits or input closes
    pub fn run(&mut self, operator: &mut dyn Operator) -> Result<()> {
        let result = self.serve(operator);
        self.acquisition.close_device(operator);
        result
    }

    fn serve(&mut self, operator: &mut dyn Operator) -> Result<()> {
        loop {
            operator.notify(Event::Menu);
            let Some(answer) = operator.ask(MENU_PROMPT)? else {
                info!("Operator input closed");
                return Ok(());
            };

            match parse_menu_choice(&answer) {
                MenuChoice::Quit => return Ok(()),
                MenuChoice::Automatic => self.automatic(operator),
                MenuChoice::Manual => {
                    self.manual(operator)?;
                }
                MenuChoice::Invalid(choice) => operator.notify(Event::InvalidChoice(choice)),
            }
        }
    }

    /// Open the device and stream until interrupted
    pub fn automatic(&mut self, operator: &mut dyn Operator) {
        let target = self.connector.describe();
        operator.notify(Event::AutomaticStarted {
            target: target.clone(),
        });

        self.stop.arm();
        match self.connector.connect() {
            Ok(device) => {
                operator.notify(Event::DeviceConnected {
                    device: device.name().to_string(),
                });
                self.acquisition.attach(device, operator);
                self.acquisition.run_device_feed(operator);
            }
            Err(e) => {
                warn!("Automatic mode unavailable: {}", e);
                operator.notify(Event::DeviceUnavailable {
                    target,
                    reason: e.to_string(),
                });
            }
        }
        self.stop.disarm();
        operator.notify(Event::ReturnToMenu);
    }

    /// Ask for one reading and classify it
    ///
    /// Invalid input abandons only this cycle. Returns `Ok(None)` when no
    /// cycle ran.
    pub fn manual(&mut self, operator: &mut dyn Operator) -> Result<Option<CycleOutcome>> {
        operator.notify(Event::ManualStarted);

        let mut values = [0.0; 3];
        for (value, prompt) in values.iter_mut().zip(MANUAL_PROMPTS) {
            let Some(answer) = operator.ask(prompt)? else {
                return Ok(None);
            };
            match parse_value(&answer) {
                Some(v) => *value = v,
                None => {
                    operator.notify(Event::InvalidNumber {
                        input: answer.trim().to_string(),
                    });
                    return Ok(None);
                }
            }
        }

        let reading = Reading::new(values[0], values[1], values[2]);
        Ok(Some(self.acquisition.run_manual_cycle(reading, operator)))
    }
}
