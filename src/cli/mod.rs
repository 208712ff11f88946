//! Command-line interface
//!
//! Argument parsing and the runner wiring each subcommand's query
//! document, record path, and cursor tree into a collector.

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
