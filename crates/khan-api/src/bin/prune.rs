//! One pruning pass over every game, for an external scheduler
//!
//! ```bash
//! cargo run -p khan-api --bin khan-prune
//! ```

use anyhow::Context;
use khan_common::{try_init_tracing, AppConfig};
use khan_service::PruneService;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Pruning failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let grace = config.graceperiod.duration();

    let state = khan_api::create_app_state(config).await?;
    let results = PruneService::new(state.service_context())
        .run_all()
        .await
        .context("Failed to list games")?;

    let total: u64 = results.iter().map(|r| r.counts.total()).sum();
    info!(games = results.len(), total, "Pruning finished");
    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }

    state.drain(grace).await;
    Ok(())
}
