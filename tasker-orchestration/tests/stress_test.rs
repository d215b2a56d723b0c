//! End-to-end run of spec §8's "Scheduler stress scenario": many
//! concurrent ten-operand sum expressions, drained by a pool of worker
//! simulators hammering the same Dispatch Protocol endpoint, asserting
//! every expression reaches the right answer with no task double-dispatched.

mod common;

use std::time::Duration;

use tasker_client::DispatchClient;
use tasker_shared::types::ExpressionStatus;
use tasker_worker::WorkerSimulator;

const EXPRESSION_COUNT: i64 = 200;
const WORKER_COUNT: usize = 20;

#[tokio::test]
async fn many_concurrent_sums_all_complete_with_correct_results() {
    let (handle, addr) = common::spawn_test_orchestrator().await;

    let mut expected = Vec::with_capacity(EXPRESSION_COUNT as usize);
    for owner_id in 0..EXPRESSION_COUNT {
        let operands: Vec<i64> = (0..10).map(|i| 1 + ((owner_id * 7 + i * 3) % 13)).collect();
        let expr_str = operands
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join("+");
        let sum: i64 = operands.iter().sum();

        let postfix = tasker_orchestration::translator::translate(&expr_str).unwrap();
        let created = handle.expressions.create(owner_id, postfix, &handle.config);
        expected.push((owner_id, created.id, sum));
    }

    let mut simulators = Vec::with_capacity(WORKER_COUNT);
    for _ in 0..WORKER_COUNT {
        let client = DispatchClient::connect(addr.clone()).await.unwrap();
        simulators.push(WorkerSimulator::new(client));
    }

    let handles: Vec<_> = simulators
        .into_iter()
        .map(|mut sim| {
            tokio::spawn(async move { sim.drain(Duration::from_millis(5), 5).await })
        })
        .collect();

    for task in handles {
        task.await.unwrap().expect("a simulator loop failed");
    }

    for (owner_id, id, sum) in expected {
        let stored = handle
            .persistence
            .get_by_owner(owner_id, id)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("expression {id} for owner {owner_id} was never persisted"));
        assert_eq!(stored.status, ExpressionStatus::Completed);
        assert_eq!(stored.result, Some(sum), "owner {owner_id} expression {id}");
    }

    // Every expression finalized and was evicted from the live registry; no
    // task was left dangling in the in-flight registry.
    assert!(handle.expressions.is_empty());
    assert!(handle.in_flight.is_empty());
}
