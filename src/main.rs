//! Pumpwise CLI
//!
//! - `pumpwise` / `pumpwise run`: train, report, then serve the menu
//! - `pumpwise train`: train and print the evaluation report

use clap::Parser;
use pumpwise::cli::{run_cli, Args};

fn main() {
    let args = Args::parse();
    let exit_code = run_cli(args);
    std::process::exit(exit_code);
}
