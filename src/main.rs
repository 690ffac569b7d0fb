//! jwt-probe: a security-testing CLI for JSON Web Tokens.
//!
//! Entry point for the application. Parses CLI arguments and delegates
//! to the appropriate command handler.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod core;
mod display;
mod error;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Parse CLI arguments and dispatch to the appropriate command handler.
///
/// Returns `ExitCode` so the caller can exit without `process::exit`,
/// allowing all destructors (including `Zeroizing`) to run.
fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Read(args) => {
            commands::read::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tamper(args) => {
            commands::tamper::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Bruteforce(args) => {
            let key_found = commands::bruteforce::execute(args)?;
            Ok(if key_found {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Attack(args) => {
            commands::attack::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
