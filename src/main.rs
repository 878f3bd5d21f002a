//! record-projector CLI
//!
//! Command-line interface for running projection jobs

use clap::Parser;
use record_projector::cli::{Cli, Runner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (stdout carries job messages only)
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        runner.report_failure(&e);
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
