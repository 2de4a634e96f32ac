mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let cli = Cli::parse();

    if cli.verbose {
        buildlens_core::logging::init_verbose();
    } else {
        buildlens_core::logging::init();
    }

    cli.execute().await
}
