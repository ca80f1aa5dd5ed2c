//! HST pipeline - Main Entry Point
//!
//! Fits the HST displacement model on one input file and writes the results.

use clap::Parser;
use hst_pipeline::cli::{cmd_run, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hst_pipeline=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cmd_run(&cli)
}
