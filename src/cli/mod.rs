//! CLI module for the Micetro reconciliation tool.
//!
//! This module provides the command-line interface for running one
//! group, zone or property reconciliation per invocation.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, ResourceArg};
pub use output::OutputFormatter;
