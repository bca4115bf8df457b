//! CLI argument structs for all commands.

use clap::Parser;
use std::path::PathBuf;

use super::types::PropagationOrderArg;

/// Arguments for the `graph` command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Declaration manifest (YAML, or JSON with a `.json` extension)
    pub manifest: PathBuf,

    /// Only show this type
    #[arg(short = 't', long = "type")]
    pub type_name: Option<String>,
}

/// Arguments for the `check` command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Declaration manifest (YAML, or JSON with a `.json` extension)
    pub manifest: PathBuf,
}

/// Arguments for the `propagate` command
#[derive(Parser, Debug, Clone)]
pub struct PropagateArgs {
    /// Declaration manifest (YAML, or JSON with a `.json` extension)
    pub manifest: PathBuf,

    /// Host type whose graph is used
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// Property whose change is simulated
    #[arg(short, long)]
    pub changed: String,

    /// Notification order (overrides the config file)
    #[arg(short, long, value_enum)]
    pub order: Option<PropagationOrderArg>,
}
