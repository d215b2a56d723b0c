//! Stateless compute worker: `COMPUTING_POWER` concurrent loops that each
//! poll `FetchTask`, perform the arithmetic (spec §1: "trivially `a⊕b`"),
//! and call `SubmitResult` (grounded in the Go original's
//! `backend/agent/handlers.go::Calc` and its poll loop in `main.go`).

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use tasker_client::{ClientError, DispatchClient};
use tasker_shared::config::WorkerConfig;

/// A running fleet of poll loops. Drop the [`watch::Sender`] half (or call
/// [`shutdown`][Self::shutdown]) to stop every loop after its current
/// iteration.
#[derive(Debug)]
pub struct Worker {
    client: DispatchClient,
    computing_power: usize,
    poll_interval: Duration,
}

impl Worker {
    /// Build a worker around an already-connected client.
    pub fn new(client: DispatchClient, config: &WorkerConfig) -> Self {
        Worker {
            client,
            computing_power: config.computing_power,
            poll_interval: config.poll_interval,
        }
    }

    /// Connect to `config.orchestrator_addr` and build a worker.
    pub async fn connect(config: &WorkerConfig) -> Result<Self, ClientError> {
        let client = DispatchClient::connect(config.orchestrator_addr.clone()).await?;
        Ok(Self::new(client, config))
    }

    /// Run `computing_power` concurrent fetch/compute/submit loops until
    /// `shutdown` is set to `true`. Each loop backs off by `poll_interval`
    /// when no task is available, so an idle worker fleet doesn't spin.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let mut handles = Vec::with_capacity(self.computing_power);
        for worker_idx in 0..self.computing_power {
            let client = self.client.clone();
            let poll_interval = self.poll_interval;
            let mut shutdown = shutdown.clone();
            handles.push(tokio::spawn(async move {
                poll_loop(worker_idx, client, poll_interval, &mut shutdown).await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn poll_loop(
    worker_idx: usize,
    mut client: DispatchClient,
    poll_interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
            outcome = client.fetch_task() => {
                match outcome {
                    Ok(Some(task)) => {
                        let result = task.compute();
                        debug!(worker_idx, pair_id = task.pair_id, op = ?task.op, result, "computed task");
                        match client.submit_result(task.pair_id, result).await {
                            Ok(()) => {}
                            Err(ClientError::DeadlineExceeded(msg)) => {
                                warn!(worker_idx, pair_id = task.pair_id, %msg, "submission rejected: deadline exceeded");
                            }
                            Err(err) => {
                                warn!(worker_idx, pair_id = task.pair_id, error = %err, "failed to submit result");
                            }
                        }
                    }
                    Ok(None) => {
                        tokio::time::sleep(jittered(poll_interval)).await;
                    }
                    Err(err) => {
                        warn!(worker_idx, error = %err, "fetch_task failed; backing off");
                        tokio::time::sleep(jittered(poll_interval)).await;
                    }
                }
            }
        }
    }
}

/// Spread out a fleet's empty-poll retries by +/-25% so `COMPUTING_POWER`
/// loops don't all hammer `FetchTask` in lockstep.
fn jittered(base: Duration) -> Duration {
    let factor = 0.75 + fastrand::f64() * 0.5;
    base.mul_f64(factor)
}

/// Build a `(sender, receiver)` pair for [`Worker::run`], already set to
/// "running".
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Flip the shutdown flag so every `poll_loop` exits after its current
/// iteration.
pub fn shutdown(tx: &watch::Sender<bool>) {
    info!("signaling worker shutdown");
    let _ = tx.send(true);
}
