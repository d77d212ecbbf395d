use anyhow::Result;
use clap::Parser;

use logvault_daemon::{cli::DaemonCli, logging, metrics_server, orchestrator::Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    let config = cli.to_config();

    logging::init_tracing(&config.general)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logvault-daemon starting");

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let mut orchestrator = Orchestrator::build(config).await?;
    orchestrator.run().await?;

    tracing::info!("logvault-daemon shut down");
    Ok(())
}
