//! Binary crate for the `cityair` dashboard backend.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading configuration
//! - Serving the JSON endpoint consumed by the dashboard
//! - Human-friendly output for one-off lookups

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
