//! Core library entry for the `chainpatch` CLI.
//!
//! `chainpatch` keeps an ordered set of registration patches applied to an
//! upstream source tree. Each unit is probed as unapplied, applied, or
//! conflicted; the engine applies or reverses the set in order, and the drift
//! monitor dry-runs it against fresh upstream snapshots, recording verdicts in
//! an append-only ledger.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod drift;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod ports;
pub mod probe;
pub mod tree;
pub mod unit;

#[cfg(test)]
mod testing;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli)
}
