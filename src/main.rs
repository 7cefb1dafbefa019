use anyhow::Result;
use clap::Parser;
use tracing::info;

use sumwarden::{BaseConfig, SumWarden};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize telemetry
    sumwarden::telemetry::init();
    info!("Starting sumwarden");

    // Parse configuration from CLI arguments
    let config = BaseConfig::parse();
    info!(
        "Configuration: tick_millis={}, max_bytes_per_cycle={}",
        config.tick_millis, config.max_bytes_per_cycle
    );

    // Initialize and run the monitor
    let warden = SumWarden::new(config)?;
    warden.run().await;

    info!("Sumwarden shutdown complete");
    Ok(())
}
