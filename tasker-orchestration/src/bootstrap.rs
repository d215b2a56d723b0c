//! Wires the engine's independently synchronized pieces (expression
//! registry, in-flight registry, persistence adapter) into a running gRPC
//! Dispatch Protocol server, the way `tasker-orchestration`'s binary wires
//! `OrchestrationBootstrap` (spec §9 design note "Global mutable state":
//! everything here is an explicit dependency, injectable for tests, instead
//! of package-level globals).

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::transport::Server;
use tracing::info;

use tasker_shared::config::OrchestratorConfig;
use tasker_shared::{TaskerError, TaskerResult};

use crate::expression_registry::ExpressionRegistry;
use crate::grpc::{DispatchServiceImpl, DispatchServiceServer, DispatchState};
use crate::in_flight::InFlightRegistry;
use crate::persistence::{Persistence, PostgresPersistence};

/// Everything a running orchestrator needs kept alive, plus a graceful
/// [`stop`][Self::stop].
pub struct OrchestrationHandle {
    pub config: OrchestratorConfig,
    pub expressions: Arc<ExpressionRegistry>,
    pub in_flight: Arc<InFlightRegistry>,
    pub persistence: Arc<dyn Persistence>,
    grpc_server: Option<JoinHandle<Result<(), tonic::transport::Error>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl std::fmt::Debug for OrchestrationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationHandle")
            .field("config", &self.config)
            .field("live_expressions", &self.expressions.len())
            .field("in_flight", &self.in_flight.len())
            .field("running", &self.grpc_server.is_some())
            .finish()
    }
}

impl OrchestrationHandle {
    /// Signal the gRPC server to stop accepting new connections and wait for
    /// it to drain. Idempotent: calling it twice is a no-op the second time.
    pub async fn stop(&mut self) -> TaskerResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.grpc_server.take() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    return Err(TaskerError::PersistenceFailure(format!(
                        "grpc server exited with an error: {err}"
                    )))
                }
                Err(err) => {
                    return Err(TaskerError::PersistenceFailure(format!(
                        "grpc server task panicked: {err}"
                    )))
                }
            }
        }
        Ok(())
    }
}

/// Bootstraps the orchestrator: connects persistence, seeds the expression
/// id cursor from `get_max_id` (spec §4.E "Id cursor initialization"), and
/// starts serving the Dispatch Protocol.
#[derive(Debug)]
pub struct OrchestrationBootstrap;

impl OrchestrationBootstrap {
    /// Production entry point: loads config from the environment and
    /// connects to Postgres.
    pub async fn bootstrap() -> TaskerResult<OrchestrationHandle> {
        let config = OrchestratorConfig::from_env();
        let persistence = PostgresPersistence::connect(&config.database_url).await?;
        Self::bootstrap_with(config, Arc::new(persistence)).await
    }

    /// Test/embedding entry point: the caller supplies its own persistence
    /// adapter (e.g. [`InMemoryPersistence`][crate::persistence::InMemoryPersistence])
    /// so the id cursor and every snapshot are fully observable without a
    /// database.
    pub async fn bootstrap_with(
        config: OrchestratorConfig,
        persistence: Arc<dyn Persistence>,
    ) -> TaskerResult<OrchestrationHandle> {
        let start_id = persistence.get_max_id().await? + 1;
        info!(start_id, "expression id cursor seeded from persistence");

        let expressions = Arc::new(ExpressionRegistry::new(start_id));
        let in_flight = Arc::new(InFlightRegistry::new());

        let addr: SocketAddr = config.grpc_addr.parse().map_err(|err| {
            TaskerError::BugInvariantViolation(format!(
                "invalid ORCHESTRATOR_GRPC_ADDR {:?}: {err}",
                config.grpc_addr
            ))
        })?;

        let dispatch_state = DispatchState::new(
            Arc::clone(&expressions),
            Arc::clone(&in_flight),
            Arc::clone(&persistence),
        );
        let service = DispatchServiceImpl::new(dispatch_state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        info!(%addr, "starting dispatch protocol server");
        let grpc_server = tokio::spawn(
            Server::builder()
                .add_service(DispatchServiceServer::new(service))
                .serve_with_shutdown(addr, async {
                    let _ = shutdown_rx.await;
                }),
        );

        Ok(OrchestrationHandle {
            config,
            expressions,
            in_flight,
            persistence,
            grpc_server: Some(grpc_server),
            shutdown_tx: Some(shutdown_tx),
        })
    }
}
