//! Binary crate for the `weather-agent` command-line chat.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive credential configuration
//! - The read-answer-print chat loop

use clap::Parser;

mod cli;
mod repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cmd = cli::Cli::parse();

    // Logs go to stderr so they never interleave with the transcript on stdout.
    let filter = if cmd.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cmd.run().await
}
