//! Shared test helpers: spins up a real Dispatch Protocol server on an
//! ephemeral port, backed by [`InMemoryPersistence`], so integration tests
//! drive the orchestrator the same way a worker would.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use tasker_orchestration::bootstrap::{OrchestrationBootstrap, OrchestrationHandle};
use tasker_orchestration::persistence::InMemoryPersistence;
use tasker_shared::config::OrchestratorConfig;

/// Claim an ephemeral local port, then drop the listener so the real server
/// can bind it. A small race window exists between the two binds; in
/// practice it is not observed in a single-process test run.
fn ephemeral_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind ephemeral port");
    let addr = listener.local_addr().expect("listener has no local addr");
    drop(listener);
    addr.to_string()
}

/// Start a fresh orchestrator with deliberately short per-operator
/// deadlines (2s is too slow for a test suite); returns the handle (keep it
/// alive for the test's duration) and the address to connect a client to.
pub async fn spawn_test_orchestrator() -> (OrchestrationHandle, String) {
    let addr = ephemeral_addr();
    let config = OrchestratorConfig {
        time_addition: Duration::from_secs(5),
        time_subtraction: Duration::from_secs(5),
        time_multiplications: Duration::from_secs(5),
        time_divisions: Duration::from_secs(5),
        grpc_addr: addr.clone(),
        database_url: String::new(),
    };
    let handle = OrchestrationBootstrap::bootstrap_with(config, Arc::new(InMemoryPersistence::new()))
        .await
        .expect("bootstrap failed");

    // Give the spawned server task a moment to start listening.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (handle, format!("http://{addr}"))
}
