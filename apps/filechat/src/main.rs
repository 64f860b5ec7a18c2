//! filechat command-line entry point.

mod app;
mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // stdout carries the event stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = config::Config::load(cli.config.as_deref())?;
    tracing::debug!(
        base_chunk_size = config.base_chunk_size,
        min_chunk_size = config.min_chunk_size,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(cli.command, config))
}
