//! # Tasker Worker
//!
//! Thin wrapper binary that connects `COMPUTING_POWER` concurrent poll loops
//! to an orchestrator's Dispatch Protocol endpoint.
//!
//! ```bash
//! COMPUTING_POWER=20 ORCHESTRATOR_GRPC_ADDR=http://127.0.0.1:50051 cargo run --bin tasker-worker
//! ```

use tokio::signal;
use tracing::{error, info};

use tasker_shared::{config::WorkerConfig, logging};
use tasker_worker::{shutdown, shutdown_channel, Worker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();

    let config = WorkerConfig::from_env();
    info!(
        computing_power = config.computing_power,
        orchestrator_addr = %config.orchestrator_addr,
        "Starting Tasker Worker..."
    );

    let worker = Worker::connect(&config).await.map_err(|e| {
        error!(error = %e, "failed to connect to orchestrator");
        e
    })?;

    let (tx, rx) = shutdown_channel();
    let run_handle = tokio::spawn(worker.run(rx));

    signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    info!("Shutdown signal received, draining poll loops...");
    shutdown(&tx);
    let _ = run_handle.await;

    info!("Tasker Worker shutdown complete");
    Ok(())
}
