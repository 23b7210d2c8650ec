//! # Delegate-Chain Node
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`DC_LOG_LEVEL`, default `info`)
//! 2. Load configuration from `DC_*` environment variables
//! 3. Open the controller, replaying the block log or creating genesis
//! 4. Start the production, status and signal-log tasks
//! 5. Run until Ctrl+C, then stop the tasks

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn log_level() -> Result<Level> {
    match std::env::var("DC_LOG_LEVEL") {
        Ok(level) => level
            .parse()
            .with_context(|| format!("DC_LOG_LEVEL={level:?} is not a log level")),
        Err(_) => Ok(Level::INFO),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level()?)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Delegate-Chain Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = NodeConfig::from_env().context("failed to load configuration")?;
    let runtime = NodeRuntime::open(config)?;
    let handles = runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown(handles).await;
    Ok(())
}
