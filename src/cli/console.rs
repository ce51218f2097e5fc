//! Terminal operator
//!
//! Renders session events as plain text on stdout and reads answers from
//! stdin. Per-cycle lines carry a `[HH:MM:SS]` timestamp.

use chrono::Local;
use pumpwise_core::metrics::{AveragedMetrics, ClassificationReport};
use pumpwise_core::operator::{Event, Operator};
use pumpwise_core::training::{ModelEvaluation, TrainedBundle};
use serde::Serialize;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use tracing::warn;

const RULE: &str = "==============================================";

pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl ConsoleOperator<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{}", text).and_then(|_| self.output.flush()) {
            warn!("Failed to write to console: {}", e);
        }
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn notify(&mut self, event: Event) {
        let text = render(&event);
        self.emit(&text);
    }
}

fn timestamp() -> String {
    Local::now().format("[%H:%M:%S]").to_string()
}

fn manual_prefix(manual: bool) -> &'static str {
    if manual {
        "(Manual) "
    } else {
        ""
    }
}

/// Operator-facing text for one event
pub fn render(event: &Event) -> String {
    match event {
        Event::Menu => format!(
            "\n{}\nSelect input mode:\n1. Automatic (from the controller)\n2. Manual (enter sensor values)\nq. Quit",
            RULE
        ),
        Event::InvalidChoice(choice) => format!(
            "Invalid choice '{}'. Please enter '1', '2' or 'q'.",
            choice
        ),
        Event::AutomaticStarted { target } => {
            format!("\n--- Automatic mode (waiting for data from {}) ---", target)
        }
        Event::DeviceConnected { device } => format!(
            "Connected to {}. Waiting for data... (Ctrl+C returns to the menu)",
            device
        ),
        Event::DeviceUnavailable { target, reason } => format!(
            "ERROR: could not connect to {}: {}\n\
             Check that the controller is plugged in, the port is correct and no other program is using it.\n\
             Automatic mode needs a serial connection.",
            target, reason
        ),
        Event::SensorError => format!("{} Controller error: the air sensor could not be read.", timestamp()),
        Event::DeviceStatus(line) => format!("{} Controller status: {}", timestamp(), line),
        Event::MalformedLine { reason } => format!(
            "{} ERROR: invalid or incomplete sensor data: {}",
            timestamp(),
            reason
        ),
        Event::ReadFailed { reason } => {
            format!("{} ERROR reading from the controller: {}", timestamp(), reason)
        }
        Event::Reading(reading) => format!(
            "{} Sensor reading:\n  Soil moisture (0-1000): {:.2}\n  Temperature: {:.2} °C\n  Air humidity: {:.2}%",
            timestamp(),
            reading.moisture,
            reading.temperature,
            reading.humidity
        ),
        Event::Decision { decision, outputs } => format!(
            "\n--- Model analysis ---\n\
             Output {} : {} --- Duration : {:.6} s\n\
             Output {} : {} --- Duration : {:.6} s\n\
             Fastest analysis : {} (Duration: {:.6} s)",
            decision.first.name,
            outputs[0],
            decision.first.latency.as_secs_f64(),
            decision.second.name,
            outputs[1],
            decision.second.latency.as_secs_f64(),
            decision.winner_name,
            decision.winning_latency().as_secs_f64()
        ),
        Event::CommandSent { command, manual } => format!(
            "  {}Sending command to the controller: '{}'",
            manual_prefix(*manual),
            command
        ),
        Event::NoCommand { label, manual } => format!(
            "  {}No motor command sent for prediction: {}",
            manual_prefix(*manual),
            label
        ),
        Event::NoDevice => {
            "  (Controller connection not active, cannot send the relay command.)".to_string()
        }
        Event::SendFailed { reason } => format!("  ERROR: command not sent: {}", reason),
        Event::CycleFailed { reason } => {
            format!("{} ERROR while processing data: {}", timestamp(), reason)
        }
        Event::ManualStarted => "\n--- Manual input mode ---".to_string(),
        Event::InvalidNumber { input } => {
            format!("Invalid input '{}'. Make sure you enter a number.", input)
        }
        Event::AutomaticStopped => "\nAutomatic mode stopped.".to_string(),
        Event::ConnectionClosed { device } => format!("Serial connection {} closed.", device),
        Event::ReturnToMenu => "Returning to the main menu.".to_string(),
    }
}

/// Machine-readable form of the startup report
#[derive(Debug, Serialize)]
pub struct EvaluationReport<'a> {
    pub training_samples: usize,
    pub test_samples: usize,
    /// Category names by label, when the target column was textual
    pub labels: Option<Vec<&'a str>>,
    pub models: &'a [ModelEvaluation],
}

impl<'a> EvaluationReport<'a> {
    pub fn new(bundle: &'a TrainedBundle) -> Self {
        Self {
            training_samples: bundle.training_samples,
            test_samples: bundle.test_samples,
            labels: bundle
                .mapping
                .as_ref()
                .map(|mapping| mapping.iter().map(|(category, _)| category).collect()),
            models: &bundle.evaluations,
        }
    }
}

/// Print the held-out evaluation of both classifiers
pub fn write_report<W: Write>(output: &mut W, bundle: &TrainedBundle) -> io::Result<()> {
    writeln!(output, "Training set size: {} samples", bundle.training_samples)?;
    writeln!(output, "Test set size: {} samples", bundle.test_samples)?;
    if let Some(mapping) = &bundle.mapping {
        writeln!(output, "Target labels: {}", mapping)?;
    }

    for evaluation in &bundle.evaluations {
        writeln!(output, "\n--- {} evaluation ---", evaluation.model)?;
        writeln!(output, "Accuracy: {:.2}", evaluation.accuracy)?;
        write_class_table(output, &evaluation.report, evaluation.test_samples)?;
        writeln!(output, "{}", evaluation.confusion)?;
    }

    writeln!(output, "\nBoth models are ready.")?;
    output.flush()
}

/// Per-class precision, recall, F1 and support, then both averages
pub fn write_class_table<W: Write>(
    output: &mut W,
    report: &ClassificationReport,
    test_samples: usize,
) -> io::Result<()> {
    writeln!(
        output,
        "{:>14} {:>9} {:>9} {:>9} {:>9}",
        "", "precision", "recall", "f1-score", "support"
    )?;
    for class in &report.classes {
        writeln!(
            output,
            "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            class.name, class.precision, class.recall, class.f1_score, class.support
        )?;
    }
    write_average_row(output, "macro avg", &report.macro_avg, test_samples)?;
    write_average_row(output, "weighted avg", &report.weighted_avg, test_samples)
}

fn write_average_row<W: Write>(
    output: &mut W,
    name: &str,
    average: &AveragedMetrics,
    test_samples: usize,
) -> io::Result<()> {
    writeln!(
        output,
        "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, average.precision, average.recall, average.f1_score, test_samples
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pumpwise_core::arbiter::{Decision, Verdict};
    use pumpwise_core::labels::Label;
    use pumpwise_core::protocol::MotorCommand;
    use std::io::Cursor;
    use std::time::Duration;

    fn console(input: &str) -> ConsoleOperator<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleOperator::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_strips_newline_and_reports_eof() {
        let mut console = console("2\r\n");
        assert_eq!(console.ask("choice: ").unwrap(), Some("2".to_string()));
        assert_eq!(console.ask("choice: ").unwrap(), None);

        let output = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(output, "choice: choice: ");
    }

    #[test]
    fn test_command_lines_mark_manual_mode() {
        let automatic = render(&Event::CommandSent {
            command: MotorCommand::On,
            manual: false,
        });
        let manual = render(&Event::CommandSent {
            command: MotorCommand::Off,
            manual: true,
        });
        assert_eq!(automatic, "  Sending command to the controller: 'MOTOR_ON'");
        assert_eq!(manual, "  (Manual) Sending command to the controller: 'MOTOR_OFF'");
    }

    #[test]
    fn test_decision_names_fastest_model() {
        let decision = Decision::from_verdicts(
            Verdict {
                name: "KNN".to_string(),
                label: Label::ON,
                latency: Duration::from_micros(900),
            },
            Verdict {
                name: "Decision Tree".to_string(),
                label: Label::ON,
                latency: Duration::from_micros(40),
            },
        );
        let text = render(&Event::Decision {
            decision,
            outputs: ["1".to_string(), "1".to_string()],
        });

        assert!(text.contains("Output KNN : 1 --- Duration : 0.000900 s"));
        assert!(text.contains("Fastest analysis : Decision Tree (Duration: 0.000040 s)"));
    }

    #[test]
    fn test_class_table_lists_each_class() {
        let truth = ndarray::array![0, 0, 0, 1, 1];
        let predicted = ndarray::array![0, 0, 1, 1, 0];
        let mapping = pumpwise_core::LabelMapping::from_values(["ON", "OFF"]);
        let report = ClassificationReport::from_predictions(&truth, &predicted, Some(&mapping));

        let mut output = Vec::new();
        write_class_table(&mut output, &report, 5).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].ends_with("precision    recall  f1-score   support"));
        assert_eq!(lines[1], "            ON      0.67      0.67      0.67         3");
        assert_eq!(lines[2], "           OFF      0.50      0.50      0.50         2");
        assert_eq!(lines[3], "     macro avg      0.58      0.58      0.58         5");
        assert_eq!(lines[4], "  weighted avg      0.60      0.60      0.60         5");
    }

    #[test]
    fn test_cycle_lines_are_timestamped() {
        let text = render(&Event::SensorError);
        let stamp = &text[..10];
        assert!(stamp.starts_with('[') && stamp.ends_with(']'));
        assert_eq!(stamp.matches(':').count(), 2);
    }
}
