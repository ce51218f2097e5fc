//! Pumpwise: interactive irrigation pump controller
//!
//! The binary is a thin shell over `pumpwise-core`: it parses arguments,
//! sets up logging and drives the session from the terminal.

pub mod cli;
