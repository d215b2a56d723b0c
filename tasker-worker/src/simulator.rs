//! An in-process stand-in for a worker, used by `tasker-orchestration`'s
//! integration tests (spec §8 "Scheduler stress scenario", "Deadline
//! scenario") instead of spawning a real worker binary.

use std::time::Duration;

use tasker_client::{ClientError, ClientResult, DispatchClient};

/// Drives a single [`DispatchClient`] through fetch/compute/submit cycles
/// under direct test control.
#[derive(Debug, Clone)]
pub struct WorkerSimulator {
    client: DispatchClient,
}

impl WorkerSimulator {
    pub fn new(client: DispatchClient) -> Self {
        WorkerSimulator { client }
    }

    /// Loop fetch -> compute -> submit until `FetchTask` reports nothing
    /// ready for `idle_rounds` consecutive polls, sleeping `poll_interval`
    /// between empty polls. Returns the number of tasks this simulator
    /// completed.
    pub async fn drain(&mut self, poll_interval: Duration, idle_rounds: usize) -> ClientResult<usize> {
        let mut completed = 0;
        let mut consecutive_idle = 0;
        while consecutive_idle < idle_rounds {
            match self.client.fetch_task().await? {
                Some(task) => {
                    consecutive_idle = 0;
                    let result = task.compute();
                    match self.client.submit_result(task.pair_id, result).await {
                        Ok(()) => completed += 1,
                        Err(ClientError::UnknownTask { .. }) => {
                            // Another simulator already completed this task
                            // between our fetch and submit (shouldn't happen
                            // given at-most-one dispatch, but tolerated here
                            // so a stress run never deadlocks on a bug it's
                            // meant to catch).
                        }
                        Err(err) => return Err(err),
                    }
                }
                None => {
                    consecutive_idle += 1;
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
        Ok(completed)
    }

    /// Fetch exactly one task, wait `delay` (intended to exceed the task's
    /// deadline), then submit a result anyway. Used to exercise the
    /// deadline-miss path deterministically.
    pub async fn fetch_then_delay_and_submit(&mut self, delay: Duration) -> ClientResult<()> {
        let task = loop {
            if let Some(task) = self.client.fetch_task().await? {
                break task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        };
        tokio::time::sleep(delay).await;
        self.client.submit_result(task.pair_id, task.compute()).await
    }
}
