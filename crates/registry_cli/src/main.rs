//! Registry CLI: the `registry` command.
//!
//! # Responsibility
//! - Parse arguments and environment configuration.
//! - Start optional file logging, run one command, map failures to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use registry_core::{default_log_level, init_logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level: &str = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match commands::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err}", err.code());
            ExitCode::from(err.exit_status())
        }
    }
}
