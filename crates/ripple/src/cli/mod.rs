//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for ripple using clap's
//! derive API. The commands work on declaration manifests, so a type's
//! dependency graph can be inspected without running its host.
//!
//! # Commands
//!
//! - `graph`: Print the dependency graph of each type
//! - `check`: Build every graph and report construction errors and cycles
//! - `propagate`: Show which properties a change would notify, in order
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--config <file>`: Engine configuration (YAML)
//! - `--verbose`: Debug logging
//!
//! # Example
//!
//! ```bash
//! ripple graph models.yaml --type Invoice
//! ripple check models.yaml
//! ripple propagate models.yaml --type Invoice --changed Subtotal --order topological
//! ```

mod args;
mod execute;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{CheckArgs, GraphArgs, PropagateArgs};
pub use types::PropagationOrderArg;

/// Ripple - derived-property change propagation
///
/// Inspect the dependency graphs described by a declaration manifest and
/// simulate which derived properties a change would re-notify.
#[derive(Parser, Debug)]
#[command(name = "ripple")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Engine configuration file (YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print dependency graphs
    ///
    /// Lists every node of each type's graph with the properties derived
    /// from it, followed by any cycles.
    Graph(GraphArgs),

    /// Check that every type's declarations form a valid graph
    ///
    /// Exits with an error if any type declares a self-dependency. Cycles
    /// are reported but are not errors.
    Check(CheckArgs),

    /// Simulate a property change
    ///
    /// Prints the derived properties that would be re-notified, in firing order.
    Propagate(PropagateArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or manifest cannot be loaded,
    /// or the command itself fails.
    pub fn execute(&self) -> Result<()> {
        use crate::output::{OutputConfig, OutputMode};

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        let output_config = OutputConfig::from_env();

        match &self.command {
            Some(Commands::Graph(args)) => execute::execute_graph(args, output_mode, &output_config),
            Some(Commands::Check(args)) => execute::execute_check(args, output_mode, &output_config),
            Some(Commands::Propagate(args)) => {
                let engine_config = execute::load_engine_config(self.config.as_deref())?;
                execute::execute_propagate(args, &engine_config, output_mode, &output_config)
            }
            None => {
                println!("Ripple derived-property propagation");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
