#![recursion_limit = "256"]

use anyhow::Result;
use clap::Parser;
use htr_pipeline::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("htr_pipeline=info".parse()?))
        .init();

    let cli = Cli::parse();
    cli.run()
}
