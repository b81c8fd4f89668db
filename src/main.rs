//! porter-yaml - porter.yaml schema contributor for YAML language services
//!
//! porter-yaml provides:
//! - A cached copy of the schema generated by `porter schema`, persisted between runs
//! - Synchronous schema URI/content resolution for porter.yaml documents
//! - On-demand and periodic schema refresh with change detection
//! - Unified output format (jsonl/json/md/raw)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backends;
mod cache;
mod cli;
mod core;
mod yaml;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(cli).await
}
