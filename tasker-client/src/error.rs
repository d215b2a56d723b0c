//! Client-side error taxonomy, mirroring the teacher's `ClientError` shape
//! (`thiserror` enum, `#[from]` conversions, an `is_recoverable()` helper)
//! with the HTTP-specific variants swapped for the gRPC transport errors
//! this client actually produces.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to dispatch server at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// `NotFound` from `FetchTask`: no expression currently has ready work.
    /// Surfaced distinctly so the worker's poll loop can treat it as
    /// "nothing to do yet" rather than a hard failure.
    #[error("no task currently available")]
    NoTaskAvailable,

    /// `NotFound` from `SubmitResult`: the `pair_id` has no in-flight entry
    /// (already completed, never dispatched, or already timed out).
    #[error("unknown task id {pair_id}")]
    UnknownTask { pair_id: i64 },

    /// `Aborted` from `SubmitResult`: the task's deadline was exceeded and
    /// its expression has been cancelled.
    #[error("submission aborted: {0}")]
    DeadlineExceeded(String),

    #[error("dispatch rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("malformed response from dispatch server: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("tasker error: {0}")]
    Tasker(#[from] tasker_shared::TaskerError),
}

impl ClientError {
    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ClientError::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call might succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. } | ClientError::NoTaskAvailable
        ) || matches!(self, ClientError::Rpc(status) if status.code() == tonic::Code::Unavailable)
    }
}
