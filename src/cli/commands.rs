//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pack-deploy - Deploys rendered pack templates to a cluster.
#[derive(Parser, Debug)]
#[command(name = "pack-deploy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "PACK_DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse, validate and conflict-check the rendered templates.
    Validate {
        /// Rendered templates directory (overrides the config file).
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },

    /// Show what a deploy would change.
    Plan {
        /// Rendered templates directory (overrides the config file).
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },

    /// Deploy the rendered templates.
    Run {
        /// Rendered templates directory (overrides the config file).
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove every object tagged with this deployment.
    Destroy {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// List pack deployments found in the cluster.
    Status,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["pack-deploy", "--output", "json", "run", "-t", "out", "--yes"])
            .expect("parse");

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Run { templates, yes } => {
                assert_eq!(templates, Some(PathBuf::from("out")));
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["pack-deploy"]).is_err());
    }
}
