//! CLI module for the pack deployment tool.
//!
//! This module provides the command-line interface that loads rendered
//! templates and drives them through the deployment pipeline.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{OutputFormatter, TerminalUi};
