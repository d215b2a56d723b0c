//! Tonic implementation of the Dispatch Protocol (spec §4.F): pull-based
//! `FetchTask` / `SubmitResult`, wired straight to the Task Graph, In-Flight
//! Registry, Expression Registry, and Persistence Adapter. This is the only
//! place in the crate allowed to mint RPC status codes (spec §7
//! "Propagation policy").

use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use tasker_shared::pairing::unpair;
use tasker_shared::proto::tasker::v1::dispatch_service_server::DispatchService;
use tasker_shared::proto::tasker::v1::{
    FetchTaskRequest, FetchTaskResponse, SubmitResultRequest, SubmitResultResponse,
};
use tasker_shared::TaskerError;

use crate::task_graph::CompletionOutcome;

use super::state::DispatchState;

/// gRPC `DispatchService` implementation.
#[derive(Debug, Clone)]
pub struct DispatchServiceImpl {
    state: DispatchState,
}

impl DispatchServiceImpl {
    pub fn new(state: DispatchState) -> Self {
        DispatchServiceImpl { state }
    }
}

#[tonic::async_trait]
impl DispatchService for DispatchServiceImpl {
    /// §4.F.1: pick any expression with ready work, take its next task,
    /// record the dispatch, and hand it to the worker.
    async fn fetch_task(
        &self,
        _request: Request<FetchTaskRequest>,
    ) -> Result<Response<FetchTaskResponse>, Status> {
        let Some(expr) = self.state.expressions.pick_ready() else {
            return Err(Status::not_found("no expression currently has a ready task"));
        };

        let outcome = expr.task_graph.take_next_ready().map_err(|err| {
            warn!(expression_id = expr.id, error = %err, "take_next_ready violated an invariant");
            Status::internal(format!("scheduler bug on expression {}: {err}", expr.id))
        })?;

        expr.set_status(if outcome.is_root {
            tasker_shared::types::ExpressionStatus::NoReady
        } else {
            tasker_shared::types::ExpressionStatus::HasReady
        });

        let task = outcome.task;
        self.state.in_flight.record_dispatch(task.clone());

        let arg1 = task.arg1.value().ok_or_else(|| {
            Status::internal(format!(
                "dispatched task {} has an unresolved arg1 (violates I2)",
                task.pair_id
            ))
        })?;
        let arg2 = task.arg2.value().ok_or_else(|| {
            Status::internal(format!(
                "dispatched task {} has an unresolved arg2 (violates I2)",
                task.pair_id
            ))
        })?;

        debug!(
            pair_id = task.pair_id,
            expression_id = expr.id,
            op = task.op.as_str(),
            "dispatched task to worker"
        );

        Ok(Response::new(FetchTaskResponse {
            pair_id: task.pair_id,
            arg1,
            arg2,
            op: task.op.as_str().to_string(),
            deadline: humantime::format_duration(task.deadline).to_string(),
        }))
    }

    /// §4.F.2: verify the in-flight entry still exists and its deadline
    /// hasn't passed, then write the result into the Task Graph. A terminal
    /// transition (Completed or Cancelled) snapshots the expression and
    /// drops it from the registry.
    async fn submit_result(
        &self,
        request: Request<SubmitResultRequest>,
    ) -> Result<Response<SubmitResultResponse>, Status> {
        let req = request.into_inner();
        let (expression_id, _ordinal) = unpair(req.pair_id);

        let Some(expr) = self.state.expressions.get(expression_id) else {
            return Err(Status::not_found(format!(
                "no expression {expression_id} (from pair_id {})",
                req.pair_id
            )));
        };

        let Some((task, elapsed)) = self.state.in_flight.take(req.pair_id) else {
            return Err(Status::not_found(format!(
                "unknown task id {}",
                req.pair_id
            )));
        };

        if elapsed > task.deadline {
            expr.mark_cancelled();
            self.finalize_if_terminal(&expr).await;
            warn!(
                pair_id = req.pair_id,
                expression_id,
                elapsed = ?elapsed,
                deadline = ?task.deadline,
                "task missed its deadline; expression cancelled"
            );
            return Err(Status::aborted(format!(
                "task {} exceeded its deadline: took {elapsed:?}, allowed {:?}",
                req.pair_id, task.deadline
            )));
        }

        let outcome = expr
            .task_graph
            .record_completion(req.pair_id, req.result)
            .map_err(|err| match err {
                TaskerError::DoubleWrite(id) => {
                    Status::not_found(format!("task {id} already computed"))
                }
                TaskerError::UnknownTaskId(id) => {
                    Status::not_found(format!("unknown task id {id}"))
                }
                other => {
                    warn!(pair_id = req.pair_id, error = %other, "record_completion violated an invariant");
                    Status::internal(format!("scheduler bug: {other}"))
                }
            })?;

        if let CompletionOutcome::ExpressionCompleted { result } = outcome {
            expr.mark_completed(result);
            info!(expression_id, result, "expression completed");
        }

        self.finalize_if_terminal(&expr).await;

        Ok(Response::new(SubmitResultResponse {}))
    }
}

impl DispatchServiceImpl {
    /// Snapshot and drop an expression once it reaches a terminal status
    /// (spec §4.F.2 step 6, I7). A persistence failure is logged and the
    /// expression is left live in the registry so it isn't silently lost
    /// (spec §7 `PersistenceFailure`).
    async fn finalize_if_terminal(&self, expr: &crate::expression_registry::ExpressionHandle) {
        use tasker_shared::types::ExpressionStatus;

        if !matches!(expr.status(), ExpressionStatus::Completed | ExpressionStatus::Cancelled) {
            return;
        }

        let short = expr.to_short();
        match self.state.persistence.insert_completed_expression(&short).await {
            Ok(()) => {
                self.state.expressions.remove(expr.id);
            }
            Err(err) => {
                warn!(
                    expression_id = expr.id,
                    error = %err,
                    "failed to persist terminal expression; leaving it live in the registry"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tasker_shared::config::OrchestratorConfig;
    use tasker_shared::types::ExpressionStatus;

    use crate::expression_registry::ExpressionRegistry;
    use crate::in_flight::InFlightRegistry;
    use crate::persistence::InMemoryPersistence;
    use crate::translator::translate;

    use super::*;

    fn service() -> (DispatchServiceImpl, DispatchState) {
        let state = DispatchState::new(
            Arc::new(ExpressionRegistry::new(1)),
            Arc::new(InFlightRegistry::new()),
            Arc::new(InMemoryPersistence::new()),
        );
        (DispatchServiceImpl::new(state.clone()), state)
    }

    #[tokio::test]
    async fn fetch_task_returns_not_found_when_nothing_ready() {
        let (svc, _state) = service();
        let err = svc
            .fetch_task(Request::new(FetchTaskRequest {}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn full_round_trip_completes_and_persists() {
        let (svc, state) = service();
        let config = OrchestratorConfig::default();
        let postfix = translate("2+3").unwrap();
        let expr = state.expressions.create(1, postfix, &config);

        let fetched = svc
            .fetch_task(Request::new(FetchTaskRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(fetched.arg1, 2);
        assert_eq!(fetched.arg2, 3);
        assert_eq!(fetched.op, "+");

        svc.submit_result(Request::new(SubmitResultRequest {
            pair_id: fetched.pair_id,
            result: 5,
        }))
        .await
        .unwrap();

        assert!(state.expressions.get(expr.id).is_none());
        let stored = state.persistence.get_by_owner(1, expr.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ExpressionStatus::Completed);
        assert_eq!(stored.result, Some(5));
    }

    #[tokio::test]
    async fn double_submit_is_rejected() {
        let (svc, state) = service();
        let config = OrchestratorConfig::default();
        state.expressions.create(9, translate("2+3").unwrap(), &config);

        let fetched = svc
            .fetch_task(Request::new(FetchTaskRequest {}))
            .await
            .unwrap()
            .into_inner();
        svc.submit_result(Request::new(SubmitResultRequest {
            pair_id: fetched.pair_id,
            result: 5,
        }))
        .await
        .unwrap();

        let err = svc
            .submit_result(Request::new(SubmitResultRequest {
                pair_id: fetched.pair_id,
                result: 999,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn deadline_miss_cancels_and_persists() {
        let (svc, state) = service();
        let mut config = OrchestratorConfig::default();
        config.time_addition = Duration::from_millis(1);
        state.expressions.create(4, translate("1+1").unwrap(), &config);

        let fetched = svc
            .fetch_task(Request::new(FetchTaskRequest {}))
            .await
            .unwrap()
            .into_inner();

        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = svc
            .submit_result(Request::new(SubmitResultRequest {
                pair_id: fetched.pair_id,
                result: 2,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Aborted);

        assert!(state.in_flight.is_empty());
        let stored = state.persistence.get_by_owner(4, 1).await.unwrap();
        assert!(stored.is_some());
        assert_eq!(stored.unwrap().status, ExpressionStatus::Cancelled);
    }

    #[tokio::test]
    async fn unknown_pair_id_on_submit_is_not_found() {
        let (svc, _state) = service();
        let err = svc
            .submit_result(Request::new(SubmitResultRequest {
                pair_id: 123_456,
                result: 1,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }
}
