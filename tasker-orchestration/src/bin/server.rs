//! # Tasker Orchestrator Server
//!
//! Thin wrapper binary that boots the Dispatch Protocol server and waits for
//! a shutdown signal.
//!
//! ```bash
//! cargo run --bin tasker-orchestrator
//! TIME_MULTIPLICATIONS=500ms cargo run --bin tasker-orchestrator
//! ```

use tokio::signal;
use tracing::{error, info};

use tasker_orchestration::bootstrap::OrchestrationBootstrap;
use tasker_shared::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();

    info!("Starting Tasker Orchestrator...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let mut handle = OrchestrationBootstrap::bootstrap()
        .await
        .map_err(|e| format!("failed to bootstrap orchestrator: {e}"))?;

    info!(addr = %handle.config.grpc_addr, "Dispatch Protocol server started");
    info!("Press Ctrl+C to shut down");

    shutdown_signal().await;

    info!("Shutdown signal received, draining in-flight requests...");
    if let Err(err) = handle.stop().await {
        error!(error = %err, "orchestrator did not shut down cleanly");
    }
    info!("Orchestrator shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
