use clap::Parser;
use tracing_subscriber::EnvFilter;

use dc_projection::api::{Cli, run_cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run_cli(Cli::parse()).await
}
