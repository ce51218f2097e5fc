//! CLI module
//!
//! Provides:
//! - Argument parsing (`run` / `train`)
//! - Logging setup
//! - The terminal operator used by the interactive session
//! - Startup dispatch and exit codes

pub mod args;
pub mod console;
pub mod dispatch;
pub mod logging;

// Re-exports
pub use args::{Args, Mode};
pub use console::ConsoleOperator;
pub use dispatch::{run_cli, ExitCode};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Core(#[from] pumpwise_core::Error),

    #[error("Cannot install interrupt handler: {0}")]
    Signal(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Interrupted outside automatic mode
pub const EXIT_INTERRUPTED: i32 = 130;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;
