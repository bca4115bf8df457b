//! Ripple CLI binary.

use anyhow::Result;
use ripple::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the ripple CLI.
fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Can be controlled via RUST_LOG environment variable
    // Example: RUST_LOG=ripple=trace ripple propagate models.yaml -t Invoice -c Subtotal
    let default_filter = if cli.verbose { "ripple=debug" } else { "ripple=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting ripple CLI");

    cli.execute()?;

    tracing::debug!("Ripple CLI completed successfully");
    Ok(())
}
