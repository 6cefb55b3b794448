//! Khan API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p khan-api
//! ```
//!
//! Configuration is loaded from `config/` files and `KHAN_*` environment
//! variables.

use anyhow::Context;
use khan_common::{try_init_tracing, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting Khan API Server...");

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!(
        address = %config.server.address(),
        webhook_workers = config.webhooks.workers,
        "Configuration loaded"
    );

    khan_api::run(config).await?;

    info!("Khan API Server stopped");
    Ok(())
}
