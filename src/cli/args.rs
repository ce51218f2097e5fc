//! CLI argument parsing
//!
//! ```text
//! pumpwise [--config PATH] [--dataset PATH] [--port NAME] [--baud N]
//!          [--log-level LEVEL] [run|train]
//! ```
//!
//! Without a subcommand the tool trains and starts the interactive session.

use clap::{Parser, Subcommand};
use pumpwise_core::ConfigOverrides;
use std::path::PathBuf;

/// Parsed CLI arguments
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(
    name = "pumpwise",
    version,
    about = "Irrigation pump control driven by two racing classifiers"
)]
pub struct Args {
    /// Configuration file (defaults to ./pumpwise.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Historical dataset CSV
    #[arg(long, global = true, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Serial port of the controller
    #[arg(long, global = true, value_name = "NAME")]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(long, global = true, value_name = "N")]
    pub baud: Option<u32>,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

/// CLI modes
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Mode {
    /// Train, report, then serve the operator menu
    Run,

    /// Train and print the evaluation report only
    Train {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    pub fn mode(&self) -> Mode {
        self.mode.clone().unwrap_or(Mode::Run)
    }

    /// Flags that take precedence over file and environment settings
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            dataset: self.dataset.clone(),
            port: self.port.clone(),
            baud_rate: self.baud,
            log_level: self.log_level.clone(),
        }
    }
}
