//! Async wrapper over the generated `tasker.v1.DispatchService` stub (spec
//! §4.F, §6): `FetchTask` maps the `NotFound` status to `Ok(None)` so a
//! worker's poll loop reads as a plain `Option`, `SubmitResult` maps
//! `Aborted`/`NotFound` to typed [`ClientError`] variants instead of letting
//! callers match on raw gRPC status codes.

use std::time::Duration;

use tonic::transport::Channel;
use tracing::trace;

use tasker_shared::proto::tasker::v1::dispatch_service_client::DispatchServiceClient;
use tasker_shared::proto::tasker::v1::{
    FetchTaskRequest, SubmitResultRequest,
};
use tasker_shared::types::Operator;

use crate::error::{ClientError, ClientResult};

/// A task pulled from `FetchTask`, with `op`/`deadline` already parsed into
/// their native types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchedTask {
    pub pair_id: i64,
    pub arg1: i64,
    pub arg2: i64,
    pub op: Operator,
    pub deadline: Duration,
}

impl FetchedTask {
    /// Apply this task's operator to its two arguments (spec §1: "trivially
    /// `a⊕b`").
    pub fn compute(&self) -> i64 {
        self.op.apply(self.arg1, self.arg2)
    }
}

/// A connected Dispatch Protocol client. Cheap to clone (the underlying
/// `tonic::transport::Channel` is itself a cheap handle), so one client can
/// back many concurrent worker loops (spec §6 `COMPUTING_POWER`).
#[derive(Debug, Clone)]
pub struct DispatchClient {
    inner: DispatchServiceClient<Channel>,
}

impl DispatchClient {
    /// Connect to the orchestrator's Dispatch Protocol endpoint, e.g.
    /// `http://127.0.0.1:50051`.
    pub async fn connect(addr: impl Into<String>) -> ClientResult<Self> {
        let addr = addr.into();
        let inner = DispatchServiceClient::connect(addr.clone())
            .await
            .map_err(|source| ClientError::Connect { addr, source })?;
        Ok(DispatchClient { inner })
    }

    /// Wrap an already-established channel (used by in-process tests that
    /// drive the server and client over the same `tonic` transport without a
    /// real socket).
    pub fn from_channel(channel: Channel) -> Self {
        DispatchClient {
            inner: DispatchServiceClient::new(channel),
        }
    }

    /// Pull the next ready task, if any. `Ok(None)` means no expression
    /// currently has ready work (spec §4.F.1 `NotFound`); callers should
    /// back off and retry rather than treat this as an error.
    pub async fn fetch_task(&mut self) -> ClientResult<Option<FetchedTask>> {
        match self.inner.fetch_task(FetchTaskRequest {}).await {
            Ok(response) => {
                let resp = response.into_inner();
                let op = resp
                    .op
                    .chars()
                    .next()
                    .and_then(Operator::from_char)
                    .ok_or_else(|| {
                        ClientError::invalid_response("op", format!("unrecognized operator {:?}", resp.op))
                    })?;
                let deadline = humantime::parse_duration(&resp.deadline).map_err(|err| {
                    ClientError::invalid_response("deadline", format!("{err}: {:?}", resp.deadline))
                })?;
                trace!(pair_id = resp.pair_id, op = resp.op, "fetched task");
                Ok(Some(FetchedTask {
                    pair_id: resp.pair_id,
                    arg1: resp.arg1,
                    arg2: resp.arg2,
                    op,
                    deadline,
                }))
            }
            Err(status) if status.code() == tonic::Code::NotFound => Ok(None),
            Err(status) => Err(status.into()),
        }
    }

    /// Report the result of a previously fetched task.
    pub async fn submit_result(&mut self, pair_id: i64, result: i64) -> ClientResult<()> {
        match self
            .inner
            .submit_result(SubmitResultRequest { pair_id, result })
            .await
        {
            Ok(_) => Ok(()),
            Err(status) if status.code() == tonic::Code::Aborted => {
                Err(ClientError::DeadlineExceeded(status.message().to_string()))
            }
            Err(status) if status.code() == tonic::Code::NotFound => {
                Err(ClientError::UnknownTask { pair_id })
            }
            Err(status) => Err(status.into()),
        }
    }
}
