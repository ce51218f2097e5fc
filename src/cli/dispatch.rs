//! CLI mode dispatch
//!
//! Startup order: configuration, logging, dataset and training, then the
//! operator session. Failures before the session starts are fatal and map
//! to an exit code; failures inside the session are handled per cycle.

use crate::cli::console::{self, ConsoleOperator};
use crate::cli::logging::{self, LogFlush};
use crate::cli::{
    Args, Error, Mode, Result, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS,
};
use pumpwise_core::{
    InterruptAction, PumpwiseConfig, SerialConnector, Session, StopSignal, TrainedBundle,
};
use std::io;
use tracing::{error, info};

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Run the selected mode and return the process exit code
pub fn run_cli(args: Args) -> ExitCode {
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let logs = match logging::init(&config.log_level, config.log_dir.as_deref()) {
        Ok(logs) => logs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let code = match execute(args.mode(), &config, &logs) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    };
    logs.flush();
    code
}

/// Defaults, file and environment, then command-line flags
pub fn load_config(args: &Args) -> Result<PumpwiseConfig> {
    let mut config = PumpwiseConfig::load(args.config.as_deref())?;
    config.apply_overrides(args.overrides())?;
    Ok(config)
}

fn execute(mode: Mode, config: &PumpwiseConfig, logs: &LogFlush) -> Result<()> {
    if let Mode::Train { json: true } = mode {
        let bundle = pumpwise_core::calibrate(config)?;
        let report = console::EvaluationReport::new(&bundle);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Loading historical dataset from {}...", config.dataset.path.display());
    let bundle = pumpwise_core::calibrate(config)?;
    console::write_report(&mut io::stdout(), &bundle)?;

    match mode {
        Mode::Train { .. } => Ok(()),
        Mode::Run => run_session(&bundle, config, logs),
    }
}

fn run_session(bundle: &TrainedBundle, config: &PumpwiseConfig, logs: &LogFlush) -> Result<()> {
    let stop = StopSignal::new();
    install_interrupt_handler(stop.clone(), logs.clone())?;

    let connector = SerialConnector::new(config.device.clone());
    let mut session = Session::new(bundle, Box::new(connector), stop);
    let mut operator = ConsoleOperator::stdio();

    info!("Session started");
    session.run(&mut operator)?;
    println!("Program finished.");
    Ok(())
}

/// Ctrl+C stops automatic mode; anywhere else it ends the program
fn install_interrupt_handler(stop: StopSignal, logs: LogFlush) -> Result<()> {
    ctrlc::set_handler(move || {
        if let Some(code) = on_interrupt(&stop, &logs) {
            std::process::exit(code);
        }
    })
    .map_err(|e| Error::Signal(e.to_string()))
}

/// Exit code to leave with, or `None` when only automatic mode stops
///
/// `process::exit` skips destructors, so file logs are flushed here first.
fn on_interrupt(stop: &StopSignal, logs: &LogFlush) -> Option<ExitCode> {
    if stop.interrupt() != InterruptAction::Exit {
        return None;
    }
    println!("\nProgram stopped by user.");
    logs.flush();
    Some(EXIT_INTERRUPTED)
}
